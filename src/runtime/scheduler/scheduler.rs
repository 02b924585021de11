// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Implementation of our single-threaded fiber scheduler.
//!
//! The scheduler stores fiber envelopes in a slab and drives them from a FIFO
//! ready queue of `(fiber, resume reason)` tasks. There is no waker-based
//! notification: every resumption is an explicit enqueue, performed either by
//! the reactor when a registration fires or by the fiber itself just before
//! yielding. Terminated envelopes go to a recycle list and are rebound by the
//! next spawn.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::scheduler::{
    Fiber,
    FiberCoroutine,
    FiberId,
    ResumeReason,
};
use ::slab::Slab;
use ::std::{
    collections::VecDeque,
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};

//==============================================================================
// Structures
//==============================================================================

/// An entry in the ready queue: a fiber and the reason it is being resumed.
#[derive(Clone, Copy, Debug)]
pub struct ReadyTask {
    pub fiber: FiberId,
    pub reason: ResumeReason,
}

/// Fiber Scheduler
pub struct Scheduler {
    /// Stores all the fiber envelopes held by the scheduler. Envelopes are
    /// boxed so their address survives slab growth.
    fibers: Slab<Box<Fiber>>,
    /// Fibers that are ready to run, in resumption order.
    ready: VecDeque<ReadyTask>,
    /// Terminated envelopes available for rebinding.
    recycled: Vec<FiberId>,
    /// The fiber currently executing, if any.
    current: Option<FiberId>,
    /// The reason the current fiber was last resumed.
    current_reason: ResumeReason,
    /// Set by `request_shutdown`; a single atomic store so it is safe from
    /// signal context.
    shutdown: AtomicBool,
}

//==============================================================================
// Associate Functions
//==============================================================================

/// Associate Functions for Scheduler
impl Scheduler {
    /// Acquires an envelope (recycled or new), binds `coroutine` onto it, and
    /// enqueues it with reason [ResumeReason::Normal].
    pub fn spawn(&mut self, name: &str, coroutine: FiberCoroutine) -> FiberId {
        let fiber_id: FiberId = match self.recycled.pop() {
            Some(fiber_id) => {
                self.fiber_mut(fiber_id).reset(name, coroutine);
                fiber_id
            },
            None => {
                let entry = self.fibers.vacant_entry();
                let fiber_id: FiberId = FiberId(entry.key());
                entry.insert(Box::new(Fiber::new(fiber_id, name, coroutine)));
                fiber_id
            },
        };
        trace!("spawn(): name={:?}, id={:?}", name, fiber_id);
        self.enqueue(fiber_id, ResumeReason::Normal);
        fiber_id
    }

    /// Appends `fiber` to the ready queue. A fiber may appear in the queue at
    /// most once at a time.
    pub fn enqueue(&mut self, fiber: FiberId, reason: ResumeReason) {
        debug_assert!(
            !self.ready.iter().any(|task| task.fiber == fiber),
            "fiber is already enqueued (id={:?})",
            fiber
        );
        self.ready.push_back(ReadyTask { fiber, reason });
    }

    /// Appends the currently running fiber to the ready queue. Must be paired
    /// with an immediate yield.
    pub fn enqueue_current(&mut self, reason: ResumeReason) {
        let fiber: FiberId = self.current_fiber();
        self.enqueue(fiber, reason);
    }

    pub fn pop_ready(&mut self) -> Option<ReadyTask> {
        self.ready.pop_front()
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Returns the fiber currently executing on the loop thread. Calling this
    /// from outside a fiber is a programmer error.
    pub fn current_fiber(&self) -> FiberId {
        self.current.expect("no fiber is running")
    }

    /// The reason that caused the currently running fiber's latest resumption.
    pub fn current_resume_reason(&self) -> ResumeReason {
        self.current_reason
    }

    pub fn set_current(&mut self, fiber: FiberId, reason: ResumeReason) {
        self.current = Some(fiber);
        self.current_reason = reason;
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn is_terminated(&self, fiber: FiberId) -> bool {
        self.fiber(fiber).is_terminated()
    }

    /// Moves a terminated fiber's envelope to the recycle list.
    pub fn recycle(&mut self, fiber: FiberId) {
        debug_assert!(self.fiber(fiber).is_terminated());
        debug_assert!(!self.recycled.contains(&fiber));
        trace!("recycle(): id={:?}", fiber);
        self.recycled.push(fiber);
    }

    /// Requests that the loop exit after the current fiber yields or
    /// terminates. A single atomic store, so it is async-signal-safe.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Returns a raw pointer to a fiber's envelope. The envelope is boxed, so
    /// the pointer stays valid across slab growth; the caller uses it to
    /// resume the fiber while reentrant scheduler calls from inside the
    /// coroutine mutate this structure.
    pub fn fiber_ptr(&mut self, fiber: FiberId) -> *mut Fiber {
        self.fiber_mut(fiber) as *mut Fiber
    }

    fn fiber(&self, fiber: FiberId) -> &Fiber {
        self.fibers
            .get(fiber.0)
            .unwrap_or_else(|| panic!("invalid fiber id ({:?})", fiber))
    }

    fn fiber_mut(&mut self, fiber: FiberId) -> &mut Fiber {
        self.fibers
            .get_mut(fiber.0)
            .unwrap_or_else(|| panic!("invalid fiber id ({:?})", fiber))
            .as_mut()
    }

    #[cfg(test)]
    pub fn num_fibers(&self) -> usize {
        self.fibers.len()
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

/// Default Trait Implementation for Scheduler
impl Default for Scheduler {
    /// Creates a scheduler with default values.
    fn default() -> Self {
        Self {
            fibers: Slab::new(),
            ready: VecDeque::new(),
            recycled: Vec::new(),
            current: None,
            current_reason: ResumeReason::Normal,
            shutdown: AtomicBool::new(false),
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use crate::runtime::scheduler::{
        FiberId,
        ReadyTask,
        ResumeReason,
        Scheduler,
    };
    use ::anyhow::Result;

    #[test]
    fn spawn_enqueues_in_fifo_order() -> Result<()> {
        let mut scheduler: Scheduler = Scheduler::default();

        let first: FiberId = scheduler.spawn("first", Box::pin(async {}));
        let second: FiberId = scheduler.spawn("second", Box::pin(async {}));
        crate::ensure_neq!(first, second);

        let task: ReadyTask = scheduler.pop_ready().expect("queue should hold two tasks");
        crate::ensure_eq!(task.fiber, first);
        crate::ensure_eq!(task.reason, ResumeReason::Normal);
        let task: ReadyTask = scheduler.pop_ready().expect("queue should hold one task");
        crate::ensure_eq!(task.fiber, second);
        crate::ensure_eq!(scheduler.pop_ready().is_none(), true);

        Ok(())
    }

    #[test]
    fn spawn_prefers_recycled_envelopes() -> Result<()> {
        let mut scheduler: Scheduler = Scheduler::default();

        let first: FiberId = scheduler.spawn("short", Box::pin(async {}));
        let task: ReadyTask = scheduler.pop_ready().expect("task was just enqueued");
        let fiber: *mut crate::runtime::scheduler::Fiber = scheduler.fiber_ptr(task.fiber);
        unsafe { (*fiber).resume() };
        crate::ensure_eq!(scheduler.is_terminated(first), true);
        scheduler.recycle(first);

        // The next spawn rebinds the terminated envelope instead of growing the slab.
        let second: FiberId = scheduler.spawn("recycled", Box::pin(async {}));
        crate::ensure_eq!(second, first);
        crate::ensure_eq!(scheduler.num_fibers(), 1);

        Ok(())
    }

    #[test]
    fn shutdown_flag_is_sticky() -> Result<()> {
        let scheduler: Scheduler = Scheduler::default();
        crate::ensure_eq!(scheduler.shutdown_requested(), false);
        scheduler.request_shutdown();
        crate::ensure_eq!(scheduler.shutdown_requested(), true);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "no fiber is running")]
    fn enqueue_current_outside_a_fiber_panics() {
        let mut scheduler: Scheduler = Scheduler::default();
        scheduler.enqueue_current(ResumeReason::Normal);
    }
}
