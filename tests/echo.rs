// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod common;

//==============================================================================
// Imports
//==============================================================================

use ::anyhow::Result;
use ::catfiber::{
    ops,
    SharedRuntime,
};
use ::socket2::Socket;
use ::std::{
    cell::RefCell,
    io::{
        Read,
        Write,
    },
    net::{
        SocketAddrV4,
        TcpStream,
    },
    os::fd::{
        AsRawFd,
        RawFd,
    },
    rc::Rc,
    thread,
    thread::JoinHandle,
};

//==============================================================================
// Echo
//==============================================================================

/// One accept-recv-send round against an external blocking peer: the acceptor
/// fiber terminates and the loop exits on its own.
#[test]
fn echo_accept_recv_send() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let (listener, addr): (Socket, SocketAddrV4) = common::listen_on_loopback()?;
    let listen_fd: RawFd = listener.as_raw_fd();
    let received: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    let runtime_2: SharedRuntime = runtime.clone();
    let received_2: Rc<RefCell<Vec<u8>>> = received.clone();
    runtime.spawn("acceptor", async move {
        let (client_fd, _peer): (RawFd, SocketAddrV4) =
            ops::accept(runtime_2.clone(), listen_fd).await.expect("accept failed");
        let mut buf: [u8; 5] = [0; 5];
        let nbytes: usize = ops::recv(runtime_2.clone(), client_fd, &mut buf, None, false)
            .await
            .expect("recv failed");
        received_2.borrow_mut().extend_from_slice(&buf[..nbytes]);
        ops::send(runtime_2.clone(), client_fd, &buf[..nbytes], None)
            .await
            .expect("send failed");
        ops::shutdown(client_fd).expect("shutdown failed");
        ops::close(client_fd).expect("close failed");
    });

    let peer: JoinHandle<Vec<u8>> = thread::spawn(move || {
        let mut stream: TcpStream = TcpStream::connect(addr).expect("peer could not connect");
        stream.write_all(b"hello").expect("peer write failed");
        let mut buf: [u8; 5] = [0; 5];
        stream.read_exact(&mut buf).expect("peer read failed");
        buf.to_vec()
    });

    runtime.run();

    let echoed: Vec<u8> = peer.join().expect("peer thread panicked");
    catfiber::ensure_eq!(echoed, b"hello".to_vec());
    catfiber::ensure_eq!(received.borrow().clone(), b"hello".to_vec());
    catfiber::ensure_eq!(runtime.waiter_count(), 0);
    Ok(())
}

/// Client and server fibers on the same loop: connect, request, response.
#[test]
fn connect_and_echo_in_process() -> Result<()> {
    let mut runtime: SharedRuntime = SharedRuntime::new()?;
    let (listener, addr): (Socket, SocketAddrV4) = common::listen_on_loopback()?;
    let listen_fd: RawFd = listener.as_raw_fd();
    let response: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    let runtime_s: SharedRuntime = runtime.clone();
    runtime.spawn("server", async move {
        let (client_fd, _peer): (RawFd, SocketAddrV4) =
            ops::accept(runtime_s.clone(), listen_fd).await.expect("accept failed");
        let request: Vec<u8> = ops::recv_buf(runtime_s.clone(), client_fd, Some(16), None, false)
            .await
            .expect("recv failed");
        ops::send(runtime_s.clone(), client_fd, &request, None)
            .await
            .expect("send failed");
        // Closing here could fold a hangup into the client's readiness event
        // before it reads; the client tears the connection down instead.
    });

    let runtime_c: SharedRuntime = runtime.clone();
    let response_2: Rc<RefCell<Vec<u8>>> = response.clone();
    runtime.spawn("client", async move {
        let socket: Socket = ops::tcp_socket().expect("socket creation failed");
        let fd: RawFd = socket.as_raw_fd();
        ops::connect(runtime_c.clone(), fd, addr).await.expect("connect failed");
        ops::send(runtime_c.clone(), fd, b"ping", None).await.expect("send failed");
        let mut buf: [u8; 4] = [0; 4];
        let nbytes: usize = ops::recv(runtime_c.clone(), fd, &mut buf, None, false)
            .await
            .expect("recv failed");
        response_2.borrow_mut().extend_from_slice(&buf[..nbytes]);
    });

    runtime.run();
    catfiber::ensure_eq!(response.borrow().clone(), b"ping".to_vec());
    Ok(())
}
