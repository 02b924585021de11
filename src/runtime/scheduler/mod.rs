// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod fiber;
mod scheduler;
mod yielder;

//==============================================================================
// Exports
//==============================================================================

pub use self::{
    fiber::{
        Fiber,
        FiberCoroutine,
        FiberId,
        FiberState,
    },
    scheduler::{
        ReadyTask,
        Scheduler,
    },
    yielder::YieldNow,
};

//==============================================================================
// Structures
//==============================================================================

/// The explanation handed to a fiber at the moment it resumes. Set when the
/// fiber is enqueued and read exactly once by the awaitable that suspended it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeReason {
    /// Plain scheduling: a fresh spawn or an explicit self-enqueue.
    Normal,
    /// The awaited descriptor became readable or writable.
    IoReady,
    /// The timeout attached to the registration fired first.
    IoTimeout,
    /// The kernel reported an error condition on the descriptor.
    IoError,
    /// The peer hung up.
    IoHup,
}
