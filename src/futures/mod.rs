// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Awaitable primitives.
//!
//! Two styles of awaitable live on top of the runtime. Direct-style
//! awaitables ([Timeout], [IoWaiter](crate::runtime::reactor::IoWaiter) and
//! the operations built from it) make exactly one reactor registration and
//! yield exactly once per suspension. Polling-style awaitables implement
//! [PollAwaitable] and are driven by [wait_on], which re-enqueues the fiber
//! before every yield; they are meant for pure in-memory readiness that user
//! code flips, never for I/O.
//!
//! Both styles obey the same rule: every yield is immediately preceded by a
//! registration that guarantees the fiber will be enqueued again.

mod callback;
mod combinators;
mod timeout;

//==============================================================================
// Exports
//==============================================================================

pub use self::{
    callback::{
        do_async,
        do_async_void,
        CallbackFuture,
        CallbackVoidFuture,
    },
    combinators::{
        await_all,
        capture_all,
    },
    timeout::Timeout,
};

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::SharedRuntime;

//==============================================================================
// Traits
//==============================================================================

/// A polling-style awaitable: readiness is probed, not registered.
pub trait PollAwaitable {
    type Output;

    /// Probes for completion. May latch state; must eventually return true
    /// through side effects performed by other fibers.
    fn is_done(&mut self) -> bool;

    /// Takes the completed value. Only valid after `is_done` returned true.
    fn take_value(&mut self) -> Self::Output;
}

//==============================================================================
// Standalone Functions
//==============================================================================

/// Drives a polling-style awaitable to completion on the current fiber,
/// yielding one loop turn between probes.
pub async fn wait_on<A: PollAwaitable>(runtime: SharedRuntime, mut awaitable: A) -> A::Output {
    while !awaitable.is_done() {
        runtime.yield_now().await;
    }
    awaitable.take_value()
}
