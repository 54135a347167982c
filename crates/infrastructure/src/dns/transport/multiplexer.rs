//! Owns the sockets of a channel and maps readiness to DNS messages.
//!
//! One UDP socket and at most one TCP connection exist per server at a time.
//! Each socket tracks the message IDs of the queries waiting on it; a socket
//! whose last query is released is closed.

use super::tcp::TcpConnection;
use super::udp::UdpConnection;
use super::Transport;
use ferrous_resolv_application::ports::{SocketFd, SocketInterest, NO_SOCKET};
use ferrous_resolv_domain::ResolveError;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::net::SocketAddr;
use tracing::{debug, warn};

enum Connection {
    Udp(UdpConnection),
    Tcp(TcpConnection),
}

impl Connection {
    fn server(&self) -> SocketAddr {
        match self {
            Self::Udp(c) => c.server(),
            Self::Tcp(c) => c.server(),
        }
    }

    fn transport(&self) -> Transport {
        match self {
            Self::Udp(_) => Transport::Udp,
            Self::Tcp(_) => Transport::Tcp,
        }
    }

    fn wants_write(&self) -> bool {
        match self {
            Self::Udp(c) => c.wants_write(),
            Self::Tcp(c) => c.wants_write(),
        }
    }

    fn is_connecting(&self) -> bool {
        match self {
            Self::Udp(_) => false,
            Self::Tcp(c) => c.is_connecting(),
        }
    }
}

struct SocketEntry {
    connection: Connection,
    pending: FxHashSet<u16>,
    /// No longer handed out for new queries; closed once `pending` drains.
    retired: bool,
}

/// Something that happened on a socket during [`SocketMultiplexer::process`].
#[derive(Debug, PartialEq, Eq)]
pub enum SocketEvent {
    /// One complete DNS message read from `fd`.
    Message { fd: SocketFd, bytes: Vec<u8> },
    /// `fd` failed and was closed; `query_ids` were waiting on it.
    Closed {
        fd: SocketFd,
        error: ResolveError,
        query_ids: Vec<u16>,
    },
}

pub struct SocketMultiplexer {
    sockets: FxHashMap<SocketFd, SocketEntry>,
    udp_by_server: FxHashMap<SocketAddr, SocketFd>,
    tcp_by_server: FxHashMap<SocketAddr, SocketFd>,
    udp_max_queries: u32,
}

impl SocketMultiplexer {
    pub fn new(udp_max_queries: u32) -> Self {
        Self {
            sockets: FxHashMap::default(),
            udp_by_server: FxHashMap::default(),
            tcp_by_server: FxHashMap::default(),
            udp_max_queries,
        }
    }

    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }

    /// Sends query `query_id` to `server`, opening a socket if needed, and
    /// returns the descriptor the response will arrive on.
    pub fn send(
        &mut self,
        server: SocketAddr,
        transport: Transport,
        query_id: u16,
        message: &[u8],
    ) -> Result<SocketFd, ResolveError> {
        let fd = self.socket_for(server, transport)?;
        let result = match self.sockets.get_mut(&fd) {
            Some(entry) => {
                let sent = match &mut entry.connection {
                    Connection::Udp(c) => c.send(message).map_err(ResolveError::from),
                    Connection::Tcp(c) => c.send(message),
                };
                if sent.is_ok() {
                    entry.pending.insert(query_id);
                }
                sent
            }
            None => Err(ResolveError::Io(format!("socket {} vanished", fd))),
        };

        match result {
            Ok(()) => {
                debug!(server = %server, transport = %transport, fd, query_id, "Query sent");
                self.retire_if_exhausted(fd);
                Ok(fd)
            }
            Err(e) => {
                warn!(server = %server, transport = %transport, error = %e, "Send failed");
                if self.sockets.get(&fd).is_some_and(|entry| entry.pending.is_empty()) {
                    self.close(fd);
                }
                Err(e)
            }
        }
    }

    /// Forgets `query_id` on `fd`; the socket is closed once nothing waits on it.
    pub fn release(&mut self, fd: SocketFd, query_id: u16) {
        let idle = match self.sockets.get_mut(&fd) {
            Some(entry) => {
                entry.pending.remove(&query_id);
                entry.pending.is_empty()
            }
            None => return,
        };
        if idle {
            self.close(fd);
        }
    }

    pub fn interest(&self) -> SocketInterest {
        let mut interest = SocketInterest::default();
        for (&fd, entry) in &self.sockets {
            if entry.connection.wants_write() {
                interest.writable.push(fd);
            }
            if !entry.pending.is_empty() && !entry.connection.is_connecting() {
                interest.readable.push(fd);
            }
        }
        interest.readable.sort_unstable();
        interest.writable.sort_unstable();
        interest
    }

    /// Performs the I/O `read_fd` / `write_fd` are ready for.
    pub fn process(&mut self, read_fd: SocketFd, write_fd: SocketFd) -> Vec<SocketEvent> {
        let mut events = Vec::new();
        if write_fd != NO_SOCKET {
            self.handle_writable(write_fd, &mut events);
        }
        if read_fd != NO_SOCKET {
            self.handle_readable(read_fd, &mut events);
        }
        events
    }

    /// Drops every socket; used on cancel-all and destroy.
    pub fn close_all(&mut self) {
        if !self.sockets.is_empty() {
            debug!(sockets = self.sockets.len(), "Closing all sockets");
        }
        self.sockets.clear();
        self.udp_by_server.clear();
        self.tcp_by_server.clear();
    }

    fn socket_for(&mut self, server: SocketAddr, transport: Transport) -> Result<SocketFd, ResolveError> {
        let index = match transport {
            Transport::Udp => &self.udp_by_server,
            Transport::Tcp => &self.tcp_by_server,
        };
        if let Some(&fd) = index.get(&server) {
            return Ok(fd);
        }

        let connection = match transport {
            Transport::Udp => Connection::Udp(UdpConnection::open(server)?),
            Transport::Tcp => Connection::Tcp(TcpConnection::open(server)?),
        };
        let fd = match &connection {
            Connection::Udp(c) => c.fd(),
            Connection::Tcp(c) => c.fd(),
        };
        self.sockets.insert(
            fd,
            SocketEntry {
                connection,
                pending: FxHashSet::default(),
                retired: false,
            },
        );
        match transport {
            Transport::Udp => self.udp_by_server.insert(server, fd),
            Transport::Tcp => self.tcp_by_server.insert(server, fd),
        };
        Ok(fd)
    }

    fn retire_if_exhausted(&mut self, fd: SocketFd) {
        if self.udp_max_queries == 0 {
            return;
        }
        let Some(entry) = self.sockets.get_mut(&fd) else {
            return;
        };
        if let Connection::Udp(c) = &entry.connection {
            if c.queries_sent() >= self.udp_max_queries && !entry.retired {
                entry.retired = true;
                self.udp_by_server.remove(&c.server());
                debug!(fd, server = %c.server(), "UDP socket retired");
            }
        }
    }

    fn handle_writable(&mut self, fd: SocketFd, events: &mut Vec<SocketEvent>) {
        let Some(entry) = self.sockets.get_mut(&fd) else {
            return;
        };
        let result = match &mut entry.connection {
            Connection::Udp(c) => c.flush(),
            Connection::Tcp(c) => c.on_writable(),
        };
        if let Err(e) = result {
            self.fail(fd, e.into(), events);
        }
    }

    fn handle_readable(&mut self, fd: SocketFd, events: &mut Vec<SocketEvent>) {
        let Some(entry) = self.sockets.get_mut(&fd) else {
            return;
        };
        let result = match &mut entry.connection {
            Connection::Udp(c) => c.receive(),
            Connection::Tcp(c) => c.on_readable(),
        };
        match result {
            Ok(messages) => {
                events.extend(
                    messages
                        .into_iter()
                        .map(|bytes| SocketEvent::Message { fd, bytes }),
                );
            }
            Err(e) => self.fail(fd, e.into(), events),
        }
    }

    fn fail(&mut self, fd: SocketFd, error: ResolveError, events: &mut Vec<SocketEvent>) {
        let Some(entry) = self.close(fd) else {
            return;
        };
        let mut query_ids: SmallVec<[u16; 8]> = entry.pending.into_iter().collect();
        query_ids.sort_unstable();
        warn!(
            fd,
            server = %entry.connection.server(),
            transport = %entry.connection.transport(),
            error = %error,
            queries = query_ids.len(),
            "Socket failed"
        );
        events.push(SocketEvent::Closed {
            fd,
            error,
            query_ids: query_ids.into_vec(),
        });
    }

    fn close(&mut self, fd: SocketFd) -> Option<SocketEntry> {
        let entry = self.sockets.remove(&fd)?;
        let server = entry.connection.server();
        let index = match entry.connection.transport() {
            Transport::Udp => &mut self.udp_by_server,
            Transport::Tcp => &mut self.tcp_by_server,
        };
        if index.get(&server) == Some(&fd) {
            index.remove(&server);
        }
        debug!(fd, server = %server, "Socket closed");
        Some(entry)
    }
}
