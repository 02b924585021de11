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
    os::fd::RawFd,
    time::Duration,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Sends the whole of `buf` on the connected socket `fd`, advancing over
/// partial progress and suspending while the send buffer is full. Completes
/// when nothing remains. An elapsed `timeout` always raises; so do hangups
/// and error conditions.
pub async fn send(runtime: SharedRuntime, fd: RawFd, buf: &[u8], timeout: Option<Duration>) -> Result<(), Fail> {
    let mut offset: usize = 0;
    while offset < buf.len() {
        let remaining: &[u8] = &buf[offset..];
        match unsafe {
            libc::send(
                fd,
                remaining.as_ptr() as *const libc::c_void,
                remaining.len(),
                libc::MSG_DONTWAIT | libc::MSG_NOSIGNAL,
            )
        } {
            // Some progress; only part of the buffer may have been taken.
            nbytes if nbytes >= 0 => {
                offset += nbytes as usize;
                trace!("data sent ({:?}/{:?} bytes)", offset, buf.len());
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno != libc::EWOULDBLOCK && errno != libc::EAGAIN {
                    let cause: String = format!("send(): operation failed (errno={:?})", errno);
                    error!("{}", cause);
                    return Err(Fail::new(errno, &cause));
                }
                match runtime.wait_for(fd, Interest::Write, timeout).await? {
                    ResumeReason::IoReady => continue,
                    ResumeReason::IoTimeout => {
                        trace!("send(): timed out (fd={:?})", fd);
                        return Err(Fail::timed_out("send(): timed out"));
                    },
                    ResumeReason::IoHup => {
                        let cause: String = format!("send(): peer hung up (fd={:?})", fd);
                        return Err(Fail::new(libc::EPIPE, &cause));
                    },
                    ResumeReason::IoError => {
                        let cause: String = format!("send(): socket failed (fd={:?})", fd);
                        error!("{}", cause);
                        return Err(Fail::new(libc::EIO, &cause));
                    },
                    ResumeReason::Normal => unreachable!("send(): I/O wait resumed without a readiness event"),
                }
            },
        }
    }
    Ok(())
}
