// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! A single-threaded cooperative fiber runtime.
//!
//! The runtime couples a FIFO fiber scheduler to an epoll-based I/O reactor.
//! User code is written as plain coroutines (`async` blocks) and spawned as
//! fibers; when an operation would block, the fiber registers its descriptor
//! with the reactor and yields, and the scheduler resumes it with a
//! [ResumeReason] once the kernel reports readiness or a timeout fires.

#![cfg_attr(feature = "strict", deny(warnings))]
#![deny(clippy::all)]

#[macro_use]
extern crate log;

mod macros;

pub mod futures;
pub mod ops;
pub mod pal;
pub mod runtime;

pub use crate::runtime::{
    fail::Fail,
    reactor::Interest,
    scheduler::{
        FiberId,
        FiberState,
        ResumeReason,
    },
    Config,
    SharedRuntime,
};
