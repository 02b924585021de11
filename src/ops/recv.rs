// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::{
    fail::Fail,
    limits,
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

/// Receives into `buf` from the connected socket `fd`, suspending while no
/// data is available. Returns the byte count of the first successful read
/// (zero means the peer performed an orderly shutdown before we suspended).
///
/// An elapsed `timeout` returns zero, unless `strict` is set, in which case it
/// raises a timed-out failure. A hangup observed while suspended raises; an
/// error condition raises.
pub async fn recv(
    runtime: SharedRuntime,
    fd: RawFd,
    buf: &mut [u8],
    timeout: Option<Duration>,
    strict: bool,
) -> Result<usize, Fail> {
    loop {
        match unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), libc::MSG_DONTWAIT) } {
            // Operation completed.
            nbytes if nbytes >= 0 => {
                trace!("data received ({:?}/{:?} bytes)", nbytes, buf.len());
                return Ok(nbytes as usize);
            },
            // Operation not completed, thus parse errno to find out what happened.
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                if errno != libc::EWOULDBLOCK && errno != libc::EAGAIN {
                    let cause: String = format!("recv(): operation failed (errno={:?})", errno);
                    error!("{}", cause);
                    return Err(Fail::new(errno, &cause));
                }
                match runtime.wait_for(fd, Interest::Read, timeout).await? {
                    ResumeReason::IoReady => continue,
                    ResumeReason::IoTimeout => {
                        trace!("recv(): timed out (fd={:?})", fd);
                        if strict {
                            return Err(Fail::timed_out("recv(): timed out"));
                        }
                        return Ok(0);
                    },
                    ResumeReason::IoHup => {
                        let cause: String = format!("recv(): peer hung up (fd={:?})", fd);
                        return Err(Fail::new(libc::ECONNRESET, &cause));
                    },
                    ResumeReason::IoError => {
                        let cause: String = format!("recv(): socket failed (fd={:?})", fd);
                        error!("{}", cause);
                        return Err(Fail::new(libc::EIO, &cause));
                    },
                    ResumeReason::Normal => unreachable!("recv(): I/O wait resumed without a readiness event"),
                }
            },
        }
    }
}

/// As [recv], but allocates the receive buffer on behalf of the caller and
/// trims it to the received byte count. `size` is capped at
/// [limits::RECVBUF_SIZE_MAX].
pub async fn recv_buf(
    runtime: SharedRuntime,
    fd: RawFd,
    size: Option<usize>,
    timeout: Option<Duration>,
    strict: bool,
) -> Result<Vec<u8>, Fail> {
    let size: usize = size.unwrap_or(limits::RECVBUF_SIZE_MAX).min(limits::RECVBUF_SIZE_MAX);
    let mut buf: Vec<u8> = vec![0; size];
    let nbytes: usize = recv(runtime, fd, &mut buf, timeout, strict).await?;
    buf.truncate(nbytes);
    Ok(buf)
}
