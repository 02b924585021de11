// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::{
    ops::socket::so_error,
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

/// Connects the non-blocking socket `fd` to `remote`, suspending while the
/// connection is in progress. Completion is checked through the socket's
/// pending error slot, so a refused or unreachable peer surfaces as a typed
/// failure with the kernel's errno.
pub async fn connect(runtime: SharedRuntime, fd: RawFd, remote: SocketAddrV4) -> Result<(), Fail> {
    let saddr: libc::sockaddr = pal::linux::socketaddrv4_to_sockaddr(&remote);
    loop {
        match unsafe { libc::connect(fd, &saddr, mem::size_of::<libc::sockaddr_in>() as libc::socklen_t) } {
            0 => {
                trace!("connection established (fd={:?}, remote={:?})", fd, remote);
                return Ok(());
            },
            _ => {
                let errno: libc::c_int = unsafe { *libc::__errno_location() };
                match errno {
                    // A retried connect reports success this way.
                    libc::EISCONN => return Ok(()),
                    libc::EINPROGRESS | libc::EALREADY | libc::EWOULDBLOCK => {
                        // The socket becomes writable once the handshake resolves,
                        // for better or worse; SO_ERROR tells which.
                        match runtime.wait_for(fd, Interest::Write, None).await? {
                            ResumeReason::IoReady | ResumeReason::IoHup | ResumeReason::IoError => {
                                match so_error(fd)? {
                                    0 => continue,
                                    so_errno => {
                                        let cause: String =
                                            format!("connect(): operation failed (errno={:?})", so_errno);
                                        error!("{}", cause);
                                        return Err(Fail::new(so_errno, &cause));
                                    },
                                }
                            },
                            reason => unreachable!("connect(): unexpected resume reason (reason={:?})", reason),
                        }
                    },
                    _ => {
                        let cause: String = format!("connect(): operation failed (errno={:?})", errno);
                        error!("{}", cause);
                        return Err(Fail::new(errno, &cause));
                    },
                }
            },
        }
    }
}
