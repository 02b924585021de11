// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Helpers shared by the integration scenarios.

#![allow(dead_code)]

//==============================================================================
// Imports
//==============================================================================

use ::anyhow::Result;
use ::socket2::Socket;
use ::std::{
    net::{
        Ipv4Addr,
        SocketAddrV4,
    },
    os::fd::RawFd,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Creates a non-blocking listening socket on an ephemeral loopback port.
pub fn listen_on_loopback() -> Result<(Socket, SocketAddrV4)> {
    let socket: Socket = catfiber::ops::tcp_socket()?;
    catfiber::ops::bind(&socket, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))?;
    catfiber::ops::listen(&socket, 16)?;
    let addr: SocketAddrV4 = catfiber::ops::local_addr(&socket)?;
    Ok((socket, addr))
}

/// Creates a non-blocking unix stream socket pair.
pub fn socketpair() -> Result<(RawFd, RawFd)> {
    let mut fds: [libc::c_int; 2] = [0; 2];
    if unsafe {
        libc::socketpair(
            libc::AF_UNIX,
            libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            0,
            fds.as_mut_ptr(),
        )
    } != 0
    {
        anyhow::bail!("socketpair() failed");
    }
    Ok((fds[0], fds[1]))
}

/// Creates a non-blocking pipe; returns (read end, write end).
pub fn pipe() -> Result<(RawFd, RawFd)> {
    let mut fds: [libc::c_int; 2] = [0; 2];
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) } != 0 {
        anyhow::bail!("pipe2() failed");
    }
    Ok((fds[0], fds[1]))
}

/// Closes a raw descriptor, ignoring errors.
pub fn close(fd: RawFd) {
    unsafe { libc::close(fd) };
}
