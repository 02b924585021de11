// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Exports
//======================================================================================================================

pub mod clock;
pub mod config;
pub mod fail;
pub mod limits;
pub mod logging;
pub mod reactor;
pub mod scheduler;
mod shared;

pub use self::{
    config::Config,
    shared::SharedObject,
};

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{
    fail::Fail,
    reactor::{
        Interest,
        IoWaiter,
        Reactor,
    },
    scheduler::{
        FiberId,
        FiberState,
        ReadyTask,
        ResumeReason,
        Scheduler,
        YieldNow,
    },
};
use crate::futures::Timeout;
use ::std::{
    future::Future,
    ops::{
        Deref,
        DerefMut,
    },
    os::fd::RawFd,
    time::Duration,
};

//======================================================================================================================
// Structures
//======================================================================================================================

/// The scheduler/reactor pair.
pub struct Runtime {
    /// Fiber scheduler.
    scheduler: Scheduler,
    /// I/O reactor.
    reactor: Reactor,
}

/// The user-facing handle to the runtime. Cheap to clone into fiber
/// coroutines; every clone refers to the same scheduler and reactor.
#[derive(Clone)]
pub struct SharedRuntime(SharedObject<Runtime>);

//======================================================================================================================
// Associate Functions
//======================================================================================================================

impl SharedRuntime {
    pub fn new() -> Result<Self, Fail> {
        Self::with_config(&Config::from_env())
    }

    pub fn with_config(config: &Config) -> Result<Self, Fail> {
        logging::initialize();
        Ok(Self(SharedObject::new(Runtime {
            scheduler: Scheduler::default(),
            reactor: Reactor::new(config)?,
        })))
    }

    /// Spawns `coroutine` as a fiber: acquires an envelope (recycled or new),
    /// binds the coroutine, and enqueues it with reason [ResumeReason::Normal].
    pub fn spawn<F: Future<Output = ()> + 'static>(&mut self, name: &str, coroutine: F) -> FiberId {
        self.scheduler.spawn(name, Box::pin(coroutine))
    }

    /// The main loop. Runs until the ready queue and the waiter table are both
    /// empty, or until a shutdown is requested. A panicking fiber propagates
    /// out of this call.
    pub fn run(&mut self) {
        trace!("run(): entering the scheduler loop");
        loop {
            // Liveness predicate: the runtime is active while anything is
            // ready to run or anything is waiting on the kernel.
            if !self.scheduler.has_ready() && self.reactor.waiter_count() == 0 {
                break;
            }

            if let Some(task) = self.scheduler.pop_ready() {
                if !self.scheduler.is_terminated(task.fiber) {
                    self.resume_fiber(task);
                }
            }

            if self.scheduler.shutdown_requested() {
                trace!("run(): shutdown requested");
                break;
            }

            // Block only when there is nothing to run and someone to wait for.
            let timeout_ms: i32 = if !self.scheduler.has_ready() && self.reactor.waiter_count() > 0 {
                -1
            } else {
                0
            };
            for (fiber, reason) in self.reactor.poll(timeout_ms) {
                self.scheduler.enqueue(fiber, reason);
            }
        }
        trace!("run(): leaving the scheduler loop");
    }

    /// Requests that the loop exit after the current fiber yields or
    /// terminates, without draining the queue. Callable from signal context.
    pub fn request_shutdown(&self) {
        self.scheduler.request_shutdown();
    }

    /// The reason that caused the currently running fiber's latest resumption.
    pub fn current_resume_reason(&self) -> ResumeReason {
        self.scheduler.current_resume_reason()
    }

    /// Yields one turn of the loop: the fiber is resumed again only after
    /// every fiber already in the queue and after one round of I/O polling.
    pub fn yield_now(&self) -> YieldNow {
        YieldNow::new(self.clone())
    }

    /// Suspends the calling fiber for at least `delay`. The deadline is fixed
    /// here, not at the first poll.
    pub fn sleep(&self, delay: Duration) -> Timeout {
        Timeout::after(self.clone(), delay)
    }

    /// Suspends the calling fiber until `fd` reports the requested readiness,
    /// the optional `timeout` elapses, or the kernel reports an error or
    /// hangup. The outcome is the resume reason.
    pub fn wait_for(&self, fd: RawFd, interest: Interest, timeout: Option<Duration>) -> IoWaiter {
        IoWaiter::new(self.clone(), fd, interest, timeout)
    }

    /// Number of outstanding reactor waiters.
    pub fn waiter_count(&self) -> usize {
        self.reactor.waiter_count()
    }

    /// Registers the currently running fiber for readiness on `fd`. Called by
    /// [IoWaiter] immediately before it yields.
    pub(crate) fn register_current_io(
        &mut self,
        fd: RawFd,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> Result<(), Fail> {
        let fiber: FiberId = self.scheduler.current_fiber();
        self.reactor.register_io(fiber, fd, interest, timeout)
    }

    /// Registers the currently running fiber for a pure timeout at `deadline`.
    /// Called by [Timeout] immediately before it yields.
    pub(crate) fn register_current_timeout(&mut self, deadline: Duration) -> Result<(), Fail> {
        let fiber: FiberId = self.scheduler.current_fiber();
        self.reactor.register_timeout(fiber, deadline)
    }

    /// Re-enqueues the currently running fiber. Called by [YieldNow]
    /// immediately before it yields.
    pub(crate) fn enqueue_current(&mut self, reason: ResumeReason) {
        self.scheduler.enqueue_current(reason);
    }

    /// Resumes one fiber and recycles its envelope if it terminated. The
    /// coroutine may re-enter this runtime through cloned handles, so the
    /// envelope is reached through a raw pointer instead of holding a borrow
    /// across the poll.
    fn resume_fiber(&mut self, task: ReadyTask) {
        self.scheduler.set_current(task.fiber, task.reason);
        let fiber: *mut scheduler::Fiber = self.scheduler.fiber_ptr(task.fiber);
        let state: FiberState = unsafe { (*fiber).resume() };
        self.scheduler.clear_current();
        if state == FiberState::Terminated {
            self.scheduler.recycle(task.fiber);
        }
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl Deref for SharedRuntime {
    type Target = Runtime;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl DerefMut for SharedRuntime {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.deref_mut()
    }
}
