// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Thin wrapper around the kernel's readiness demultiplexer.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::fail::Fail;
use ::std::{
    io,
    os::fd::RawFd,
};

//==============================================================================
// Structures
//==============================================================================

/// Owns the epoll instance that carries every interest registered with the
/// reactor.
pub struct Demux {
    epoll_fd: RawFd,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Demux {
    pub fn new() -> Result<Self, Fail> {
        match unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) } {
            fd if fd >= 0 => Ok(Self { epoll_fd: fd }),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("failed to create epoll instance (errno={:?})", errno);
                error!("new(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    /// Adds `fd` to the interest set. `user_data` is returned verbatim with
    /// every readiness event for this descriptor.
    pub fn add(&self, fd: RawFd, events: u32, user_data: u64) -> Result<(), Fail> {
        let mut epoll_event: libc::epoll_event = libc::epoll_event {
            events,
            u64: user_data,
        };
        match unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_ADD, fd, &mut epoll_event) } {
            0 => Ok(()),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("failed to register interest (fd={:?}, errno={:?})", fd, errno);
                error!("add(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    /// Removes `fd` from the interest set. A descriptor that was already
    /// closed or never registered is tolerated.
    pub fn delete(&self, fd: RawFd) -> Result<(), Fail> {
        match unsafe { libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut()) } {
            0 => Ok(()),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno == libc::EBADF || errno == libc::ENOENT {
                    warn!("interest was already removed or never registered (fd={:?})", fd);
                    return Ok(());
                }
                let cause: String = format!("failed to remove interest (fd={:?}, errno={:?})", fd, errno);
                error!("delete(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    /// Drains one batch of ready events into `events`, blocking for at most
    /// `timeout_ms` milliseconds (-1 blocks indefinitely). An interrupted wait
    /// returns an empty batch so the loop can iterate; any other failure of
    /// the wait is fatal.
    pub fn wait(&self, events: &mut Vec<libc::epoll_event>, max_events: usize, timeout_ms: i32) -> usize {
        events.clear();
        events.reserve(max_events);
        match unsafe { libc::epoll_wait(self.epoll_fd, events.as_mut_ptr(), max_events as i32, timeout_ms) } {
            n if n >= 0 => {
                unsafe { events.set_len(n as usize) };
                n as usize
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno == libc::EINTR {
                    return 0;
                }
                panic!(
                    "epoll_wait failed (errno={:?}, {})",
                    errno,
                    io::Error::from_raw_os_error(errno)
                );
            },
        }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Drop for Demux {
    fn drop(&mut self) {
        match unsafe { libc::close(self.epoll_fd) } {
            0 => (),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                warn!("could not close epoll instance (errno={:?})", errno);
            },
        }
    }
}
