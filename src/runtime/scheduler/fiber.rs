// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Fiber envelopes.
//!
//! A fiber is a heap-pinned envelope around a coroutine plus its lifecycle
//! state. The envelope (and therefore the coroutine) never moves after
//! creation, and it survives the coroutine's termination so that a later
//! [reset](Fiber::reset) can rebind a fresh entry onto the same storage.

//==============================================================================
// Imports
//==============================================================================

use ::futures::task::noop_waker_ref;
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

/// Externally visible fiber identifier. Identifiers are reused when a
/// terminated fiber's envelope is recycled.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct FiberId(pub usize);

/// Execution state of a fiber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FiberState {
    /// Bound to an entry that has not run yet.
    Runnable,
    /// Currently executing on the loop thread.
    Running,
    /// Yielded; waiting for a re-enqueue.
    Suspended,
    /// The entry returned. The envelope may be recycled.
    Terminated,
}

/// The coroutine type a fiber runs.
pub type FiberCoroutine = Pin<Box<dyn Future<Output = ()>>>;

/// A cooperatively scheduled unit of execution.
pub struct Fiber {
    /// Identifier, stable across recycling.
    id: FiberId,
    /// Fiber name, used for diagnostics.
    name: String,
    /// Underlying coroutine to run. Dropped on termination.
    coroutine: Option<FiberCoroutine>,
    /// Current execution state.
    state: FiberState,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Fiber {
    /// Instantiates a new fiber bound to `coroutine`.
    pub fn new(id: FiberId, name: &str, coroutine: FiberCoroutine) -> Self {
        Self {
            id,
            name: name.to_string(),
            coroutine: Some(coroutine),
            state: FiberState::Runnable,
        }
    }

    pub fn id(&self) -> FiberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> FiberState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == FiberState::Terminated
    }

    /// Transfers control into the fiber. Returns when the fiber yields or
    /// terminates; the returned state distinguishes the two. Resuming a
    /// terminated fiber is a programmer error.
    pub fn resume(&mut self) -> FiberState {
        assert!(
            self.state != FiberState::Terminated,
            "resuming a terminated fiber (id={:?})",
            self.id
        );
        let mut coroutine: FiberCoroutine = self
            .coroutine
            .take()
            .expect("a live fiber must hold a coroutine");
        self.state = FiberState::Running;

        // Wakeups come from the scheduler's ready queue, never from a waker,
        // so an inert one is handed to the coroutine.
        let mut context: Context = Context::from_waker(noop_waker_ref());
        match coroutine.as_mut().poll(&mut context) {
            Poll::Ready(()) => {
                self.state = FiberState::Terminated;
            },
            Poll::Pending => {
                self.coroutine = Some(coroutine);
                self.state = FiberState::Suspended;
            },
        }
        self.state
    }

    /// Rebinds a fresh entry onto this terminated envelope. The fiber becomes
    /// indistinguishable from a newly constructed one with the same entry.
    pub fn reset(&mut self, name: &str, coroutine: FiberCoroutine) {
        assert!(
            self.state == FiberState::Terminated,
            "resetting a live fiber (id={:?}, state={:?})",
            self.id,
            self.state
        );
        self.name = name.to_string();
        self.coroutine = Some(coroutine);
        self.state = FiberState::Runnable;
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::{
        Fiber,
        FiberId,
        FiberState,
    };
    use ::anyhow::Result;
    use ::std::{
        future::Future,
        pin::Pin,
        task::{
            Context,
            Poll,
        },
    };

    /// A coroutine that stays pending for `yields` polls before completing.
    struct CountdownCoroutine {
        yields: usize,
    }

    impl Future for CountdownCoroutine {
        type Output = ();

        fn poll(self: Pin<&mut Self>, _context: &mut Context) -> Poll<()> {
            let self_: &mut Self = self.get_mut();
            if self_.yields == 0 {
                return Poll::Ready(());
            }
            self_.yields -= 1;
            Poll::Pending
        }
    }

    #[test]
    fn resume_runs_entry_to_termination() -> Result<()> {
        let mut fiber: Fiber = Fiber::new(FiberId(0), "testing", Box::pin(CountdownCoroutine { yields: 0 }));
        crate::ensure_eq!(fiber.state(), FiberState::Runnable);
        crate::ensure_eq!(fiber.resume(), FiberState::Terminated);
        crate::ensure_eq!(fiber.is_terminated(), true);
        Ok(())
    }

    #[test]
    fn resume_suspends_on_yield() -> Result<()> {
        let mut fiber: Fiber = Fiber::new(FiberId(0), "testing", Box::pin(CountdownCoroutine { yields: 1 }));
        crate::ensure_eq!(fiber.resume(), FiberState::Suspended);
        crate::ensure_eq!(fiber.resume(), FiberState::Terminated);
        Ok(())
    }

    #[test]
    fn reset_rebinds_a_terminated_envelope() -> Result<()> {
        let mut fiber: Fiber = Fiber::new(FiberId(7), "first", Box::pin(CountdownCoroutine { yields: 0 }));
        fiber.resume();
        fiber.reset("second", Box::pin(CountdownCoroutine { yields: 1 }));
        crate::ensure_eq!(fiber.id(), FiberId(7));
        crate::ensure_eq!(fiber.name(), "second");
        crate::ensure_eq!(fiber.resume(), FiberState::Suspended);
        crate::ensure_eq!(fiber.resume(), FiberState::Terminated);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "resuming a terminated fiber")]
    fn resume_after_termination_panics() {
        let mut fiber: Fiber = Fiber::new(FiberId(0), "testing", Box::pin(CountdownCoroutine { yields: 0 }));
        fiber.resume();
        fiber.resume();
    }
}
