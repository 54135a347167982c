//! TCP connection to a nameserver (RFC 1035 §4.2.2)
//!
//! Every message carries a 2-byte big-endian length prefix. Queries are
//! pipelined on one connection and responses are routed by message ID.

use bytes::{Buf, BytesMut};
use ferrous_resolv_domain::ResolveError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::{AsRawFd, RawFd};
use tracing::debug;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;
const READ_CHUNK: usize = 4096;

pub struct TcpConnection {
    stream: TcpStream,
    server: SocketAddr,
    connecting: bool,
    write_buf: BytesMut,
    read_buf: BytesMut,
}

impl TcpConnection {
    /// Starts a non-blocking connect; completion is observed on write readiness.
    pub fn open(server: SocketAddr) -> io::Result<Self> {
        let domain = if server.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        socket.set_tcp_nodelay(true)?;

        let connecting = match socket.connect(&server.into()) {
            Ok(()) => false,
            Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => true,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(e) => return Err(e),
        };

        let stream: TcpStream = socket.into();
        debug!(server = %server, fd = stream.as_raw_fd(), connecting, "Opened TCP socket");

        Ok(Self {
            stream,
            server,
            connecting,
            write_buf: BytesMut::new(),
            read_buf: BytesMut::new(),
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    pub fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn wants_write(&self) -> bool {
        self.connecting || !self.write_buf.is_empty()
    }

    /// Queues a length-prefixed copy of `message` and writes what the socket
    /// accepts right away.
    pub fn send(&mut self, message: &[u8]) -> Result<(), ResolveError> {
        encode_with_length_prefix(message, &mut self.write_buf)?;
        if !self.connecting {
            self.flush()?;
        }
        Ok(())
    }

    /// Completes a pending connect and writes buffered data.
    pub fn on_writable(&mut self) -> io::Result<()> {
        if self.connecting {
            if let Some(err) = self.stream.take_error()? {
                return Err(err);
            }
            self.stream.peer_addr()?;
            self.connecting = false;
            debug!(server = %self.server, "TCP connection established");
        }
        self.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.write_buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Reads available stream data and returns every complete message.
    ///
    /// End of stream is reported as `UnexpectedEof` once the buffered
    /// messages have been drained.
    pub fn on_readable(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut eof = false;
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => self.read_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let mut messages = Vec::new();
        while let Some(message) = decode_length_prefixed(&mut self.read_buf) {
            messages.push(message);
        }
        debug!(server = %self.server, messages = messages.len(), eof, "TCP data received");

        if eof && messages.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection to {} closed by peer", self.server),
            ));
        }
        Ok(messages)
    }
}

pub(crate) fn encode_with_length_prefix(
    message: &[u8],
    out: &mut BytesMut,
) -> Result<(), ResolveError> {
    if message.len() > MAX_TCP_MESSAGE_SIZE {
        return Err(ResolveError::BadQuery(format!(
            "Message too large: {} bytes (max {})",
            message.len(),
            MAX_TCP_MESSAGE_SIZE
        )));
    }
    out.reserve(2 + message.len());
    out.extend_from_slice(&(message.len() as u16).to_be_bytes());
    out.extend_from_slice(message);
    Ok(())
}

/// Splits one complete message off the front of `buf`, if present.
pub(crate) fn decode_length_prefixed(buf: &mut BytesMut) -> Option<Vec<u8>> {
    if buf.len() < 2 {
        return None;
    }
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    if buf.len() < 2 + len {
        return None;
    }
    buf.advance(2);
    Some(buf.split_to(len).to_vec())
}
