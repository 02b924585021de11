// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::fail::Fail;
use ::socket2::{
    Domain,
    Protocol,
    Socket,
    Type,
};
use ::std::{
    io,
    net::{
        SocketAddr,
        SocketAddrV4,
    },
    os::fd::RawFd,
};

//==============================================================================
// Standalone Functions
//==============================================================================

/// Creates a non-blocking TCP socket, configured the way every socket in this
/// runtime must be before it can be awaited on.
pub fn tcp_socket() -> Result<Socket, Fail> {
    let socket: Socket = match Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)) {
        Ok(socket) => socket,
        Err(e) => {
            let cause: String = format!("failed to create socket: {:?}", e);
            error!("tcp_socket(): {}", cause);
            return Err(Fail::new(get_libc_err(e), &cause));
        },
    };
    if let Err(e) = socket.set_reuse_address(true) {
        let cause: String = format!("cannot set REUSE_ADDRESS option: {:?}", e);
        error!("tcp_socket(): {}", cause);
        return Err(Fail::new(get_libc_err(e), &cause));
    }
    if let Err(e) = socket.set_nodelay(true) {
        let cause: String = format!("cannot set TCP_NODELAY option: {:?}", e);
        error!("tcp_socket(): {}", cause);
        return Err(Fail::new(get_libc_err(e), &cause));
    }
    if let Err(e) = socket.set_nonblocking(true) {
        let cause: String = format!("cannot set NONBLOCKING option: {:?}", e);
        error!("tcp_socket(): {}", cause);
        return Err(Fail::new(get_libc_err(e), &cause));
    }
    Ok(socket)
}

/// Binds `socket` to `local`.
pub fn bind(socket: &Socket, local: SocketAddrV4) -> Result<(), Fail> {
    trace!("bind(): local={:?}", local);
    if let Err(e) = socket.bind(&SocketAddr::V4(local).into()) {
        let cause: String = format!("failed to bind socket: {:?}", e);
        error!("bind(): {}", cause);
        return Err(Fail::new(get_libc_err(e), &cause));
    }
    Ok(())
}

/// Puts `socket` into passive listening mode.
pub fn listen(socket: &Socket, backlog: i32) -> Result<(), Fail> {
    trace!("listen(): backlog={:?}", backlog);
    if let Err(e) = socket.listen(backlog) {
        let cause: String = format!("failed to listen on socket: {:?}", e);
        error!("listen(): {}", cause);
        return Err(Fail::new(get_libc_err(e), &cause));
    }
    Ok(())
}

/// Returns the local address `socket` is bound to.
pub fn local_addr(socket: &Socket) -> Result<SocketAddrV4, Fail> {
    let addr: SocketAddr = match socket.local_addr() {
        Ok(addr) => match addr.as_socket() {
            Some(addr) => addr,
            None => return Err(Fail::new(libc::EAFNOSUPPORT, "socket is not an inet socket")),
        },
        Err(e) => {
            let cause: String = format!("failed to get local address: {:?}", e);
            error!("local_addr(): {}", cause);
            return Err(Fail::new(get_libc_err(e), &cause));
        },
    };
    match addr {
        SocketAddr::V4(addr) => Ok(addr),
        SocketAddr::V6(_) => Err(Fail::new(libc::EAFNOSUPPORT, "socket is not an IPv4 socket")),
    }
}

/// Returns the remote address `socket` is connected to.
pub fn peer_addr(socket: &Socket) -> Result<SocketAddrV4, Fail> {
    let addr: SocketAddr = match socket.peer_addr() {
        Ok(addr) => match addr.as_socket() {
            Some(addr) => addr,
            None => return Err(Fail::new(libc::EAFNOSUPPORT, "socket is not an inet socket")),
        },
        Err(e) => {
            let cause: String = format!("failed to get peer address: {:?}", e);
            error!("peer_addr(): {}", cause);
            return Err(Fail::new(get_libc_err(e), &cause));
        },
    };
    match addr {
        SocketAddr::V4(addr) => Ok(addr),
        SocketAddr::V6(_) => Err(Fail::new(libc::EAFNOSUPPORT, "socket is not an IPv4 socket")),
    }
}

/// Shuts down both directions of a connected socket. A socket that is no
/// longer connected is tolerated.
pub fn shutdown(fd: RawFd) -> Result<(), Fail> {
    match unsafe { libc::shutdown(fd, libc::SHUT_RDWR) } {
        0 => Ok(()),
        _ => {
            let errno: libc::c_int = unsafe { *libc::__errno_location() };
            if errno == libc::ENOTCONN {
                return Ok(());
            }
            let cause: String = format!("failed to shut down socket (fd={:?}, errno={:?})", fd, errno);
            error!("shutdown(): {}", cause);
            Err(Fail::new(errno, &cause))
        },
    }
}

/// Closes a descriptor owned by the caller.
pub fn close(fd: RawFd) -> Result<(), Fail> {
    match unsafe { libc::close(fd) } {
        0 => Ok(()),
        _ => {
            let errno: libc::c_int = unsafe { *libc::__errno_location() };
            let cause: String = format!("failed to close descriptor (fd={:?}, errno={:?})", fd, errno);
            error!("close(): {}", cause);
            Err(Fail::new(errno, &cause))
        },
    }
}

/// Reads the pending error slot of a socket.
pub(crate) fn so_error(fd: RawFd) -> Result<i32, Fail> {
    let mut so_error: libc::c_int = 0;
    let mut len: libc::socklen_t = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    match unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut so_error as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    } {
        0 => Ok(so_error),
        _ => {
            let errno: libc::c_int = unsafe { *libc::__errno_location() };
            let cause: String = format!("failed to read SO_ERROR (fd={:?}, errno={:?})", fd, errno);
            error!("so_error(): {}", cause);
            Err(Fail::new(errno, &cause))
        },
    }
}

/// Extracts the raw OS error code.
pub(crate) fn get_libc_err(e: io::Error) -> i32 {
    e.raw_os_error().unwrap_or(libc::EIO)
}
