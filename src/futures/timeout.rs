// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    clock,
    fail::Fail,
    SharedRuntime,
};
use ::std::{
    future::Future,
    pin::Pin,
    task::{
        Context,
        Poll,
    },
    time::Duration,
};

//==============================================================================
// Structures
//==============================================================================

/// A future that completes once the monotonic clock passes its deadline.
///
/// The deadline is fixed when the future is constructed, so a timeout whose
/// construction is decoupled from its first await still measures from
/// construction. Awaiting registers a timer descriptor once and yields; any
/// resumption completes the future, since a pure timer has no alternate
/// readiness.
pub struct Timeout {
    runtime: SharedRuntime,
    /// Absolute expiry on the monotonic clock.
    deadline: Duration,
    /// Have we registered (and yielded) yet?
    registered: bool,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Timeout {
    /// Creates a timeout that expires `delay` from now.
    pub fn after(runtime: SharedRuntime, delay: Duration) -> Self {
        Self::at(runtime, clock::now() + delay)
    }

    /// Creates a timeout that expires at `deadline`, an absolute value of the
    /// monotonic clock.
    pub fn at(runtime: SharedRuntime, deadline: Duration) -> Self {
        Self {
            runtime,
            deadline,
            registered: false,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Future for Timeout {
    type Output = Result<(), Fail>;

    fn poll(self: Pin<&mut Self>, _context: &mut Context) -> Poll<Self::Output> {
        let self_: &mut Self = self.get_mut();
        if !self_.registered {
            self_.registered = true;
            if let Err(e) = self_.runtime.register_current_timeout(self_.deadline) {
                return Poll::Ready(Err(e));
            }
            return Poll::Pending;
        }
        Poll::Ready(Ok(()))
    }
}
