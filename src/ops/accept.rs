// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::{
    pal,
    runtime::{
        fail::Fail,
        reactor::Interest,
        scheduler::ResumeReason,
        SharedRuntime,
    },
};
use ::std::{
    mem,
    net::SocketAddrV4,
    os::fd::RawFd,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Waits for a connection on the listening socket `fd` and accepts it. The
/// returned descriptor is already non-blocking and close-on-exec.
pub async fn accept(runtime: SharedRuntime, fd: RawFd) -> Result<(RawFd, SocketAddrV4), Fail> {
    loop {
        // The listening socket reports readable when a connection is pending.
        match runtime.wait_for(fd, Interest::Read, None).await? {
            ResumeReason::IoReady => (),
            ResumeReason::IoHup => {
                let cause: String = format!("accept(): listening socket hung up (fd={:?})", fd);
                error!("{}", cause);
                return Err(Fail::new(libc::ECONNABORTED, &cause));
            },
            ResumeReason::IoError => {
                let cause: String = format!("accept(): listening socket failed (fd={:?})", fd);
                error!("{}", cause);
                return Err(Fail::new(libc::EIO, &cause));
            },
            reason => unreachable!("accept(): unexpected resume reason (reason={:?})", reason),
        }

        let mut saddr: libc::sockaddr = unsafe { mem::zeroed() };
        let mut addrlen: libc::socklen_t = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        match unsafe { libc::accept4(fd, &mut saddr, &mut addrlen, libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC) } {
            new_fd if new_fd >= 0 => {
                trace!("connection accepted (fd={:?})", new_fd);
                return Ok((new_fd, pal::linux::sockaddr_to_socketaddrv4(&saddr)));
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                // Spurious readiness: wait again.
                if errno == libc::EWOULDBLOCK || errno == libc::EAGAIN {
                    continue;
                }
                let cause: String = format!("accept(): operation failed (errno={:?})", errno);
                error!("{}", cause);
                return Err(Fail::new(errno, &cause));
            },
        }
    }
}
