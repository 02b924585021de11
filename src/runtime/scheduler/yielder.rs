// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    scheduler::ResumeReason,
    SharedRuntime,
};
use ::std::{
    future::Future,
    pin::Pin,
    task::{
        Context,
        Poll,
    },
};

//==============================================================================
// Structures
//==============================================================================

/// YieldNow is a future that lets the currently running fiber cooperatively
/// yield one turn of the loop. The fiber re-enqueues itself *before* yielding,
/// so it is guaranteed to be resumed again, after every fiber already in the
/// queue and after one round of I/O polling.
pub struct YieldNow {
    runtime: SharedRuntime,
    /// Have we already yielded?
    yielded: bool,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl YieldNow {
    pub(crate) fn new(runtime: SharedRuntime) -> Self {
        Self {
            runtime,
            yielded: false,
        }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Future for YieldNow {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _context: &mut Context) -> Poll<Self::Output> {
        let self_: &mut Self = self.get_mut();
        if !self_.yielded {
            self_.yielded = true;
            self_.runtime.enqueue_current(ResumeReason::Normal);
            return Poll::Pending;
        }
        Poll::Ready(())
    }
}
