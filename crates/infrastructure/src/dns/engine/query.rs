use super::completion::QueryCallback;
use super::lookup::LookupId;
use crate::dns::transport::Transport;
use ferrous_resolv_application::ports::SocketFd;
use ferrous_resolv_domain::RecordType;
use std::time::Instant;

/// Non-terminal states of a query. Terminal states are only observable
/// through the callback outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Created,
    /// Handed to the multiplexer, socket not yet confirmed.
    Sent,
    /// On the wire, waiting for a response or its deadline.
    Waiting,
    /// Previous attempt failed; about to be sent again.
    Retrying,
}

/// Where the decoded answer of a query goes.
pub(crate) enum Sink {
    Records(QueryCallback),
    /// Part of a host, address or name-info lookup.
    Lookup(LookupId),
}

pub(crate) struct PendingQuery {
    pub(crate) id: u16,
    pub(crate) name: String,
    pub(crate) record_type: RecordType,
    pub(crate) message: Vec<u8>,
    pub(crate) server: usize,
    /// Attempts left after the one in flight.
    pub(crate) remaining: u32,
    pub(crate) deadline: Instant,
    pub(crate) transport: Transport,
    pub(crate) fd: Option<SocketFd>,
    pub(crate) state: QueryState,
    pub(crate) sink: Sink,
}

impl PendingQuery {
    pub(crate) fn is_user_query(&self) -> bool {
        matches!(self.sink, Sink::Records(_))
    }
}
