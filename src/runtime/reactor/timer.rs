// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::fail::Fail;
use ::std::{
    mem,
    os::fd::RawFd,
    ptr,
    time::Duration,
};

//==============================================================================
// Structures
//==============================================================================

/// A kernel timer descriptor. Becomes readable when its deadline expires.
/// The reactor owns every timer descriptor it creates; dropping the handle
/// releases the kernel resource.
pub struct TimerFd {
    fd: RawFd,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl TimerFd {
    /// Creates a disarmed timer descriptor on the monotonic clock.
    pub fn new() -> Result<Self, Fail> {
        match unsafe { libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC) } {
            fd if fd >= 0 => Ok(Self { fd }),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("failed to create timer descriptor (errno={:?})", errno);
                error!("new(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    /// Arms the timer to fire at `deadline`, an absolute value of the
    /// monotonic clock. A deadline in the past fires immediately.
    pub fn arm(&self, deadline: Duration) -> Result<(), Fail> {
        // A zero expiration disarms the descriptor instead of firing it.
        let deadline: Duration = if deadline.is_zero() {
            Duration::from_nanos(1)
        } else {
            deadline
        };
        let mut spec: libc::itimerspec = unsafe { mem::zeroed() };
        spec.it_value.tv_sec = deadline.as_secs() as libc::time_t;
        spec.it_value.tv_nsec = deadline.subsec_nanos() as libc::c_long;
        match unsafe { libc::timerfd_settime(self.fd, libc::TFD_TIMER_ABSTIME, &spec, ptr::null_mut()) } {
            0 => Ok(()),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("failed to arm timer descriptor (fd={:?}, errno={:?})", self.fd, errno);
                error!("arm(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Drop for TimerFd {
    fn drop(&mut self) {
        match unsafe { libc::close(self.fd) } {
            0 => (),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                warn!("could not close timer descriptor (fd={:?}, errno={:?})", self.fd, errno);
            },
        }
    }
}
