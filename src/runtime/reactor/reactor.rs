// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The I/O reactor.
//!
//! The reactor translates between "this fiber needs to wait for X" and the
//! kernel's readiness model. It owns the demultiplexer and the waiter table
//! mapping each registered descriptor to the fiber suspended on it. A
//! registration may pair an I/O descriptor with a timer descriptor; firing
//! either side resumes the fiber and cancels the other side in the same
//! dispatch step.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    clock,
    config::Config,
    fail::Fail,
    reactor::{
        demux::Demux,
        payload::{
            EventPayload,
            TaggedFd,
        },
        timer::TimerFd,
        Interest,
    },
    scheduler::{
        FiberId,
        ResumeReason,
    },
};
use ::std::{
    collections::HashMap,
    os::fd::RawFd,
    time::Duration,
};

//==============================================================================
// Structures
//==============================================================================

/// A row in the waiter table: the suspended fiber and, when this row is the
/// I/O side of a paired registration (or a pure timeout), the owned timer
/// descriptor. Dropping the row releases the timer.
struct WaiterEntry {
    fiber: FiberId,
    timer: Option<TimerFd>,
}

/// I/O Reactor
pub struct Reactor {
    /// Kernel readiness demultiplexer.
    demux: Demux,
    /// Outstanding waiters, keyed by registered descriptor.
    waiters: HashMap<RawFd, WaiterEntry>,
    /// Scratch buffer for one batch of kernel events.
    events: Vec<libc::epoll_event>,
    /// Descriptors cancelled while dispatching the current batch. An event for
    /// such a descriptor later in the same batch is stale and is skipped.
    cancelled: Vec<RawFd>,
    /// Maximum number of events drained per poll.
    batch_size: usize,
}

//==============================================================================
// Associate Functions
//==============================================================================

/// Associate Functions for the I/O Reactor
impl Reactor {
    pub fn new(config: &Config) -> Result<Self, Fail> {
        Ok(Self {
            demux: Demux::new()?,
            waiters: HashMap::new(),
            events: Vec::with_capacity(config.epoll_batch_size),
            cancelled: Vec::new(),
            batch_size: config.epoll_batch_size,
        })
    }

    /// Number of outstanding waiters. Each registered descriptor counts, so a
    /// timeout-paired I/O registration contributes two.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Associates `fiber` with `fd`: the next readiness event on `fd` (or, if
    /// `timeout` is given, the expiry of the paired timer, whichever comes
    /// first) removes the registration and resumes the fiber. Registering a
    /// descriptor that already has a waiter is a programmer error.
    pub fn register_io(
        &mut self,
        fiber: FiberId,
        fd: RawFd,
        interest: Interest,
        timeout: Option<Duration>,
    ) -> Result<(), Fail> {
        assert!(
            !self.waiters.contains_key(&fd),
            "descriptor already has a waiter (fd={:?})",
            fd
        );
        debug_assert!(
            self.waiters.values().all(|entry| entry.fiber != fiber),
            "fiber is already registered for another descriptor (id={:?})",
            fiber
        );

        let timer: Option<TimerFd> = match timeout {
            Some(delay) => {
                let timer: TimerFd = TimerFd::new()?;
                timer.arm(clock::now() + delay)?;
                Some(timer)
            },
            None => None,
        };

        let io_payload: u64 = EventPayload::new(
            TaggedFd::io(fd),
            timer.as_ref().map(|timer| TaggedFd::timer(timer.raw_fd())),
        )
        .encode();
        self.demux.add(fd, interest.events(), io_payload)?;

        if let Some(timer) = &timer {
            let timer_fd: RawFd = timer.raw_fd();
            // Mirrored payload, so whichever side fires first can cancel the other.
            let timer_payload: u64 = EventPayload::new(TaggedFd::timer(timer_fd), Some(TaggedFd::io(fd))).encode();
            if let Err(e) = self.demux.add(timer_fd, libc::EPOLLIN as u32, timer_payload) {
                let _ = self.demux.delete(fd);
                return Err(e);
            }
            self.waiters.insert(timer_fd, WaiterEntry { fiber, timer: None });
        }

        self.waiters.insert(fd, WaiterEntry { fiber, timer });
        trace!(
            "register_io(): fd={:?}, interest={:?}, timeout={:?}, waiters={:?}",
            fd,
            interest,
            timeout,
            self.waiters.len()
        );
        Ok(())
    }

    /// Registers `fiber` for a pure timeout: a timer descriptor armed at
    /// `deadline` (an absolute value of the monotonic clock) stands in as the
    /// I/O descriptor.
    pub fn register_timeout(&mut self, fiber: FiberId, deadline: Duration) -> Result<(), Fail> {
        debug_assert!(
            self.waiters.values().all(|entry| entry.fiber != fiber),
            "fiber is already registered for another descriptor (id={:?})",
            fiber
        );

        let timer: TimerFd = TimerFd::new()?;
        timer.arm(deadline)?;
        let timer_fd: RawFd = timer.raw_fd();

        let payload: u64 = EventPayload::new(TaggedFd::timer(timer_fd), None).encode();
        self.demux.add(timer_fd, libc::EPOLLIN as u32, payload)?;
        self.waiters.insert(timer_fd, WaiterEntry { fiber, timer: Some(timer) });
        trace!(
            "register_timeout(): fd={:?}, deadline={:?}, waiters={:?}",
            timer_fd,
            deadline,
            self.waiters.len()
        );
        Ok(())
    }

    /// Drains one batch of ready events, blocking for at most `timeout_ms`
    /// milliseconds (-1 blocks indefinitely). Returns the woken fibers, in
    /// kernel order, for the scheduler to enqueue.
    pub fn poll(&mut self, timeout_ms: i32) -> Vec<(FiberId, ResumeReason)> {
        let mut events: Vec<libc::epoll_event> = std::mem::take(&mut self.events);
        let num_events: usize = self.demux.wait(&mut events, self.batch_size, timeout_ms);
        self.cancelled.clear();

        let mut wakeups: Vec<(FiberId, ResumeReason)> = Vec::with_capacity(num_events);
        for i in 0..num_events {
            let event: libc::epoll_event = events[i];
            if let Some(wakeup) = self.dispatch(&event) {
                wakeups.push(wakeup);
            }
        }
        self.events = events;
        wakeups
    }

    /// Handles one readiness event: removes the registration (both sides, for
    /// a pair) from the waiter table and the kernel interest set, then returns
    /// the fiber to wake and the reason. Returns None for an event whose
    /// descriptor was cancelled earlier in this batch.
    fn dispatch(&mut self, event: &libc::epoll_event) -> Option<(FiberId, ResumeReason)> {
        let payload: EventPayload = EventPayload::decode(event.u64);
        let primary: TaggedFd = payload.primary;

        let entry: WaiterEntry = match self.waiters.remove(&primary.fd) {
            Some(entry) => entry,
            None => {
                if self.cancelled.contains(&primary.fd) {
                    trace!("dispatch(): stale event for cancelled descriptor (fd={:?})", primary.fd);
                    return None;
                }
                panic!("readiness event for unknown descriptor (fd={:?})", primary.fd);
            },
        };

        if let Err(e) = self.demux.delete(primary.fd) {
            warn!("dispatch(): could not remove interest (fd={:?}, error={:?})", primary.fd, e);
        }

        // Cancel the pair mate: its kernel registration, its waiter-table row,
        // and (through the row's drop) the timer descriptor itself.
        if let Some(extra) = payload.extra {
            if let Err(e) = self.demux.delete(extra.fd) {
                warn!("dispatch(): could not remove interest (fd={:?}, error={:?})", extra.fd, e);
            }
            if let Some(mate) = self.waiters.remove(&extra.fd) {
                debug_assert!(mate.fiber == entry.fiber);
            }
            self.cancelled.push(extra.fd);
        }

        let reason: ResumeReason = Self::resume_reason_for(event.events, primary.is_timer);
        trace!("dispatch(): fd={:?}, reason={:?}", primary.fd, reason);
        Some((entry.fiber, reason))
    }

    /// Classifies raw readiness flags into a resume reason. Hangups trump
    /// errors, errors trump readiness; a readable timer descriptor means the
    /// timeout fired.
    fn resume_reason_for(events: u32, timer_origin: bool) -> ResumeReason {
        if events & (libc::EPOLLHUP | libc::EPOLLRDHUP) as u32 != 0 {
            ResumeReason::IoHup
        } else if events & libc::EPOLLERR as u32 != 0 {
            ResumeReason::IoError
        } else if events & libc::EPOLLIN as u32 != 0 {
            if timer_origin {
                ResumeReason::IoTimeout
            } else {
                ResumeReason::IoReady
            }
        } else if events & libc::EPOLLOUT as u32 != 0 {
            ResumeReason::IoReady
        } else {
            warn!("resume_reason_for(): unexpected readiness flags (events={:#x})", events);
            ResumeReason::IoError
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================
