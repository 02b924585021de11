// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Non-blocking file operations.
//!
//! Descriptors are opened with `O_NONBLOCK` and read or written through the
//! same would-block protocol as the socket operations. Regular files never
//! report would-block on Linux, so their operations complete without
//! suspending; the suspension path is exercised by pipe-like descriptors,
//! which the reactor's demultiplexer accepts.

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
    ffi::CString,
    os::fd::RawFd,
};

//==============================================================================
// Structures
//==============================================================================

/// A non-blocking file descriptor, closed on drop.
pub struct File {
    fd: RawFd,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl File {
    /// Opens a file for reading.
    pub fn open_read(path: &str) -> Result<Self, Fail> {
        Self::open_with_flags(path, libc::O_RDONLY | libc::O_NONBLOCK | libc::O_CLOEXEC, 0)
    }

    /// Creates or truncates a file for writing, mode 0644.
    pub fn create_write(path: &str) -> Result<Self, Fail> {
        Self::open_with_flags(
            path,
            libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_NONBLOCK | libc::O_CLOEXEC,
            0o644,
        )
    }

    fn open_with_flags(path: &str, flags: libc::c_int, mode: libc::mode_t) -> Result<Self, Fail> {
        let path_c: CString = match CString::new(path) {
            Ok(path_c) => path_c,
            Err(_) => return Err(Fail::new(libc::EINVAL, "path contains an interior nul byte")),
        };
        match unsafe { libc::open(path_c.as_ptr(), flags, mode as libc::c_uint) } {
            fd if fd >= 0 => Ok(Self { fd }),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("failed to open file (path={:?}, errno={:?})", path, errno);
                error!("open_with_flags(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Number of bytes that can be read without suspending.
    pub fn available(&self) -> Result<usize, Fail> {
        let mut pending: libc::c_int = 0;
        match unsafe { libc::ioctl(self.fd, libc::FIONREAD as libc::c_ulong, &mut pending) } {
            0 => Ok(pending as usize),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                let cause: String = format!("FIONREAD failed (fd={:?}, errno={:?})", self.fd, errno);
                error!("available(): {}", cause);
                Err(Fail::new(errno, &cause))
            },
        }
    }
}

//==============================================================================
// Standalone Functions
//==============================================================================

/// Reads into `buf` from the non-blocking descriptor `fd`, suspending while
/// no data is available. Returns the byte count of the first successful read;
/// zero means end of input.
pub async fn read(runtime: SharedRuntime, fd: RawFd, buf: &mut [u8]) -> Result<usize, Fail> {
    loop {
        match unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) } {
            nbytes if nbytes >= 0 => {
                trace!("data read ({:?}/{:?} bytes)", nbytes, buf.len());
                return Ok(nbytes as usize);
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno != libc::EWOULDBLOCK && errno != libc::EAGAIN {
                    let cause: String = format!("read(): operation failed (errno={:?})", errno);
                    error!("{}", cause);
                    return Err(Fail::new(errno, &cause));
                }
                match runtime.wait_for(fd, Interest::Read, None).await? {
                    // A hangup here is the writer closing; the retried read
                    // reports end of input.
                    ResumeReason::IoReady | ResumeReason::IoHup => continue,
                    ResumeReason::IoError => {
                        let cause: String = format!("read(): descriptor failed (fd={:?})", fd);
                        error!("{}", cause);
                        return Err(Fail::new(libc::EIO, &cause));
                    },
                    reason => unreachable!("read(): unexpected resume reason (reason={:?})", reason),
                }
            },
        }
    }
}

/// Writes the whole of `buf` to the non-blocking descriptor `fd`, advancing
/// over partial progress and suspending while the descriptor cannot take
/// more.
pub async fn write_all(runtime: SharedRuntime, fd: RawFd, buf: &[u8]) -> Result<(), Fail> {
    let mut offset: usize = 0;
    while offset < buf.len() {
        let remaining: &[u8] = &buf[offset..];
        match unsafe { libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len()) } {
            nbytes if nbytes >= 0 => {
                offset += nbytes as usize;
                trace!("data written ({:?}/{:?} bytes)", offset, buf.len());
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno != libc::EWOULDBLOCK && errno != libc::EAGAIN {
                    let cause: String = format!("write_all(): operation failed (errno={:?})", errno);
                    error!("{}", cause);
                    return Err(Fail::new(errno, &cause));
                }
                match runtime.wait_for(fd, Interest::Write, None).await? {
                    ResumeReason::IoReady => continue,
                    ResumeReason::IoHup => {
                        let cause: String = format!("write_all(): reader hung up (fd={:?})", fd);
                        return Err(Fail::new(libc::EPIPE, &cause));
                    },
                    ResumeReason::IoError => {
                        let cause: String = format!("write_all(): descriptor failed (fd={:?})", fd);
                        error!("{}", cause);
                        return Err(Fail::new(libc::EIO, &cause));
                    },
                    reason => unreachable!("write_all(): unexpected resume reason (reason={:?})", reason),
                }
            },
        }
    }
    Ok(())
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl Drop for File {
    fn drop(&mut self) {
        match unsafe { libc::close(self.fd) } {
            0 => (),
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                warn!("could not close file (fd={:?}, errno={:?})", self.fd, errno);
            },
        }
    }
}
