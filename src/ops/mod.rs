// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Awaitable socket and file operations.
//!
//! Every operation here follows the direct await protocol: attempt the
//! syscall on the non-blocking descriptor; on would-block, register the
//! descriptor with the reactor and yield; on resumption, consult the resume
//! reason and retry, return, or raise a typed failure.

mod accept;
mod activity;
mod connect;
mod file;
mod recv;
mod send;
mod socket;

//==============================================================================
// Exports
//==============================================================================

pub use self::{
    accept::accept,
    activity::wait_for_activity,
    connect::connect,
    file::{
        read,
        write_all,
        File,
    },
    recv::{
        recv,
        recv_buf,
    },
    send::send,
    socket::{
        bind,
        close,
        listen,
        local_addr,
        peer_addr,
        shutdown,
        tcp_socket,
    },
};
