// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    fail::Fail,
    reactor::Interest,
    scheduler::ResumeReason,
    SharedRuntime,
};
use ::std::{
    future::Future,
    os::fd::RawFd,
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

/// The direct-style awaitable for descriptor readiness: the first poll makes
/// exactly one reactor registration and yields; the second poll reports the
/// reason the fiber was resumed with. The registration itself guarantees the
/// re-enqueue, so yielding here can never strand the fiber.
pub struct IoWaiter {
    runtime: SharedRuntime,
    fd: RawFd,
    interest: Interest,
    timeout: Option<Duration>,
    /// Have we registered (and yielded) yet?
    registered: bool,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl IoWaiter {
    pub(crate) fn new(runtime: SharedRuntime, fd: RawFd, interest: Interest, timeout: Option<Duration>) -> Self {
        Self {
            runtime,
            fd,
            interest,
            timeout,
            registered: false,
        }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Future for IoWaiter {
    type Output = Result<ResumeReason, Fail>;

    fn poll(self: Pin<&mut Self>, _context: &mut Context) -> Poll<Self::Output> {
        let self_: &mut Self = self.get_mut();
        if !self_.registered {
            self_.registered = true;
            if let Err(e) = self_.runtime.register_current_io(self_.fd, self_.interest, self_.timeout) {
                return Poll::Ready(Err(e));
            }
            return Poll::Pending;
        }
        Poll::Ready(Ok(self_.runtime.current_resume_reason()))
    }
}
