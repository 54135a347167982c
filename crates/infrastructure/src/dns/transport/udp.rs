//! UDP connection to a nameserver (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is (no framing). The socket is connected to the
//! server so ICMP port-unreachable surfaces as `ECONNREFUSED` on the next
//! receive, and datagrams from other peers are filtered by the kernel.

use socket2::{Domain, Protocol, Socket, Type};
use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::os::fd::{AsRawFd, RawFd};
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpConnection {
    socket: UdpSocket,
    server: SocketAddr,
    /// Datagrams that hit `WouldBlock` and wait for write readiness.
    outbound: VecDeque<Vec<u8>>,
    queries_sent: u32,
    /// Socket error read after datagrams in the same drain, reported next.
    pending_error: Option<io::Error>,
}

impl UdpConnection {
    pub fn open(server: SocketAddr) -> io::Result<Self> {
        let domain = if server.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_nonblocking(true)?;

        let bind_addr: SocketAddr = if server.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        socket.bind(&bind_addr.into())?;
        socket.connect(&server.into())?;

        let socket: UdpSocket = socket.into();
        debug!(server = %server, fd = socket.as_raw_fd(), "Opened UDP socket");

        Ok(Self {
            socket,
            server,
            outbound: VecDeque::new(),
            queries_sent: 0,
            pending_error: None,
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    pub fn fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    pub fn queries_sent(&self) -> u32 {
        self.queries_sent
    }

    pub fn wants_write(&self) -> bool {
        !self.outbound.is_empty() || self.pending_error.is_some()
    }

    /// Sends `message` now, or queues it when the socket buffer is full.
    pub fn send(&mut self, message: &[u8]) -> io::Result<()> {
        self.queries_sent = self.queries_sent.saturating_add(1);
        if !self.outbound.is_empty() {
            self.outbound.push_back(message.to_vec());
            return Ok(());
        }
        match self.socket.send(message) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.outbound.push_back(message.to_vec());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Flushes queued datagrams until the socket would block.
    pub fn flush(&mut self) -> io::Result<()> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        while let Some(message) = self.outbound.front() {
            match self.socket.send(message) {
                Ok(_) => {
                    self.outbound.pop_front();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Reads every datagram currently queued on the socket.
    ///
    /// An error hit after some datagrams were read is held back and
    /// returned by the next `receive` or `flush`.
    pub fn receive(&mut self) -> io::Result<Vec<Vec<u8>>> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        let socket = &self.socket;
        let (datagrams, error) = drain(|buf| socket.recv(buf));
        match error {
            Some(e) if datagrams.is_empty() => return Err(e),
            Some(e) => {
                debug!(server = %self.server, error = %e, "Deferring UDP socket error");
                self.pending_error = Some(e);
            }
            None => {}
        }
        debug!(server = %self.server, datagrams = datagrams.len(), "UDP datagrams received");
        Ok(datagrams)
    }
}

/// Calls `recv` until it would block or fails.
fn drain<F>(mut recv: F) -> (Vec<Vec<u8>>, Option<io::Error>)
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let mut datagrams = Vec::new();
    let mut buf = [0u8; MAX_UDP_RESPONSE_SIZE];
    loop {
        match recv(&mut buf) {
            Ok(len) => datagrams.push(buf[..len].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return (datagrams, None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (datagrams, Some(e)),
        }
    }
}
