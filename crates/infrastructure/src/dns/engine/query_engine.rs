//! Query/lookup orchestration: owns every pending query and composite
//! lookup of a channel, drives them through the multiplexer and queues
//! their completions for the next processing pass.

use super::completion::{Completion, HostCallback, NameInfoCallback, QueryCallback};
use super::lookup::{self, HostByName, Lookup, LookupId};
use super::query::{PendingQuery, QueryState, Sink};
use crate::dns::codec::{MessageBuilder, ParsedResponse, RecordExtractor, ResponseParser};
use crate::dns::transport::{SocketEvent, SocketMultiplexer, Transport};
use ferrous_resolv_application::ports::{Clock, ServiceCatalogPort, SocketFd, SocketInterest};
use ferrous_resolv_application::services::{NameserverSelector, RetryDecision, RetryPolicy};
use ferrous_resolv_domain::{
    reverse_address, AddressFamily, ChannelConfig, ConfigError, HostEntry, HostsTable, NameInfo,
    NameInfoFlags, Nameserver, RecordType, ResolveError,
};
use hickory_proto::op::Message;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct QueryEngine {
    servers: Vec<Nameserver>,
    policy: RetryPolicy,
    selector: NameserverSelector,
    multiplexer: SocketMultiplexer,
    hosts: HostsTable,
    clock: Arc<dyn Clock>,
    catalog: Arc<dyn ServiceCatalogPort>,
    use_tcp: bool,
    ignore_truncation: bool,
    recursion_desired: bool,
    queries: FxHashMap<u16, PendingQuery>,
    lookups: FxHashMap<LookupId, Lookup>,
    next_lookup: LookupId,
    ready: VecDeque<Completion>,
}

impl QueryEngine {
    pub fn new(
        config: &ChannelConfig,
        clock: Arc<dyn Clock>,
        catalog: Arc<dyn ServiceCatalogPort>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            servers: config.nameservers()?,
            policy: RetryPolicy::from_config(config),
            selector: NameserverSelector::from_rotate(config.rotate),
            multiplexer: SocketMultiplexer::new(config.udp_max_queries),
            hosts: HostsTable::from_entries(&config.hosts)?,
            clock,
            catalog,
            use_tcp: config.use_tcp,
            ignore_truncation: config.ignore_truncation,
            recursion_desired: !config.no_recursion,
            queries: FxHashMap::default(),
            lookups: FxHashMap::default(),
            next_lookup: 0,
            ready: VecDeque::new(),
        })
    }

    pub fn servers(&self) -> &[Nameserver] {
        &self.servers
    }

    /// Replaces the server list used by new queries and by retries.
    pub fn set_servers(&mut self, servers: Vec<Nameserver>) {
        info!(
            servers = ?servers.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Nameservers updated"
        );
        self.servers = servers;
    }

    /// Outstanding callbacks: record queries, composite lookups and queued
    /// completions.
    pub fn active_queries(&self) -> usize {
        self.queries.values().filter(|q| q.is_user_query()).count()
            + self.lookups.len()
            + self.ready.len()
    }

    /// State of every query currently on the wire or between attempts.
    pub fn query_states(&self) -> Vec<QueryState> {
        self.queries.values().map(|q| q.state).collect()
    }

    pub fn query(
        &mut self,
        name: &str,
        record_type: RecordType,
        callback: QueryCallback,
    ) -> Result<(), ResolveError> {
        MessageBuilder::parse_name(name)?;
        self.start_query(name, record_type, Sink::Records(callback));
        Ok(())
    }

    pub fn gethostbyname(
        &mut self,
        name: &str,
        family: AddressFamily,
        callback: HostCallback,
    ) -> Result<(), ResolveError> {
        let literal = name.trim();
        if let Ok(ip) = literal.parse::<IpAddr>() {
            let result = if family.matches(&ip) {
                Ok(HostEntry::new(literal).with_addresses(vec![ip]))
            } else {
                Err(ResolveError::NotFound)
            };
            self.ready.push_back(Completion::Host(callback, result));
            return Ok(());
        }

        MessageBuilder::parse_name(name)?;
        if let Some(entry) = self.hosts.lookup_name(name, family) {
            debug!(name = %name, family = %family, "Answered from hosts table");
            self.ready.push_back(Completion::Host(callback, Ok(entry)));
            return Ok(());
        }

        let record_types: SmallVec<[RecordType; 2]> = match family {
            AddressFamily::Inet => smallvec![RecordType::A],
            AddressFamily::Inet6 => smallvec![RecordType::AAAA],
            AddressFamily::Unspec => smallvec![RecordType::A, RecordType::AAAA],
        };
        let lookup_id = self.next_lookup_id();
        self.lookups.insert(
            lookup_id,
            Lookup::HostByName(HostByName::new(name, record_types.len(), callback)),
        );
        for record_type in record_types {
            self.start_query(name, record_type, Sink::Lookup(lookup_id));
        }
        Ok(())
    }

    pub fn gethostbyaddr(&mut self, address: IpAddr, callback: HostCallback) {
        if let Some(entry) = self.hosts.lookup_addr(&address) {
            debug!(address = %address, "Answered from hosts table");
            self.ready.push_back(Completion::Host(callback, Ok(entry)));
            return;
        }

        let lookup_id = self.next_lookup_id();
        self.lookups
            .insert(lookup_id, Lookup::HostByAddr { address, callback });
        self.start_query(
            &reverse_address(&address),
            RecordType::PTR,
            Sink::Lookup(lookup_id),
        );
    }

    pub fn getnameinfo(
        &mut self,
        address: SocketAddr,
        flags: NameInfoFlags,
        callback: NameInfoCallback,
    ) -> Result<(), ResolveError> {
        if !flags.is_valid() {
            return Err(ResolveError::BadFlags);
        }
        let lookup_host = flags.contains(NameInfoFlags::LOOKUPHOST) || flags.lookup_unspecified();
        let lookup_service = flags.contains(NameInfoFlags::LOOKUPSERVICE);

        let service = lookup_service
            .then(|| lookup::service_name(self.catalog.as_ref(), address.port(), flags));
        let ip = address.ip();

        let node = if !lookup_host {
            None
        } else if flags.contains(NameInfoFlags::NUMERICHOST) {
            Some(ip.to_string())
        } else if let Some(entry) = self.hosts.lookup_addr(&ip) {
            Some(lookup::strip_domain(entry.name, flags))
        } else {
            let lookup_id = self.next_lookup_id();
            self.lookups.insert(
                lookup_id,
                Lookup::NameInfo {
                    address,
                    flags,
                    service,
                    callback,
                },
            );
            self.start_query(&reverse_address(&ip), RecordType::PTR, Sink::Lookup(lookup_id));
            return Ok(());
        };

        self.ready
            .push_back(Completion::NameInfo(callback, Ok(NameInfo { node, service })));
        Ok(())
    }

    pub fn interest(&self) -> SocketInterest {
        self.multiplexer.interest()
    }

    /// Time until the earliest deadline; zero while completions are queued.
    pub fn timeout(&self) -> Option<Duration> {
        if !self.ready.is_empty() {
            return Some(Duration::ZERO);
        }
        let now = self.clock.now();
        self.queries
            .values()
            .map(|q| q.deadline.saturating_duration_since(now))
            .min()
    }

    /// One processing pass: socket I/O, expired deadlines, then callbacks.
    pub fn process(&mut self, read_fd: SocketFd, write_fd: SocketFd) {
        for event in self.multiplexer.process(read_fd, write_fd) {
            match event {
                SocketEvent::Message { fd, bytes } => self.on_message(fd, &bytes),
                SocketEvent::Closed {
                    error, query_ids, ..
                } => {
                    // The descriptor is gone and may be reused by a retry below.
                    for id in &query_ids {
                        if let Some(query) = self.queries.get_mut(id) {
                            query.fd = None;
                        }
                    }
                    for id in query_ids {
                        if self.on_attempt_failed(id, error.clone()) {
                            self.dispatch(id);
                        }
                    }
                }
            }
        }
        self.expire();
        self.deliver();
    }

    /// Ends every query and lookup with `Cancelled`, invoking callbacks now.
    pub fn cancel_all(&mut self) -> usize {
        let queries = std::mem::take(&mut self.queries);
        let lookups = std::mem::take(&mut self.lookups);
        let ready = std::mem::take(&mut self.ready);

        let mut cancelled = 0;
        for (id, query) in queries {
            if let Some(fd) = query.fd {
                self.multiplexer.release(fd, id);
            }
            if let Sink::Records(callback) = query.sink {
                callback(Err(ResolveError::Cancelled));
                cancelled += 1;
            }
        }
        for (_, lookup) in lookups {
            lookup.cancel();
            cancelled += 1;
        }
        for completion in ready {
            completion.cancel();
            cancelled += 1;
        }
        self.multiplexer.close_all();

        if cancelled > 0 {
            debug!(cancelled, "Cancelled all queries");
        }
        cancelled
    }

    fn next_lookup_id(&mut self) -> LookupId {
        let id = self.next_lookup;
        self.next_lookup = self.next_lookup.wrapping_add(1);
        id
    }

    /// Random message ID not used by any pending query.
    fn allocate_id(&self) -> Option<u16> {
        let start = fastrand::u16(..);
        (0..=u16::MAX)
            .map(|offset| start.wrapping_add(offset))
            .find(|id| !self.queries.contains_key(id))
    }

    fn start_query(&mut self, name: &str, record_type: RecordType, sink: Sink) {
        if self.servers.is_empty() {
            self.complete(record_type, sink, Err(ResolveError::NoServers));
            return;
        }
        let Some(id) = self.allocate_id() else {
            warn!(active = self.queries.len(), "No free message id");
            self.complete(
                record_type,
                sink,
                Err(ResolveError::Io("no free message id".to_string())),
            );
            return;
        };
        let message = match MessageBuilder::build_query_with_id(
            name,
            record_type,
            id,
            self.recursion_desired,
        ) {
            Ok(message) => message,
            Err(e) => {
                self.complete(record_type, sink, Err(e));
                return;
            }
        };

        let query = PendingQuery {
            id,
            name: name.to_string(),
            record_type,
            message,
            server: self.selector.initial(self.servers.len()),
            remaining: self.policy.tries() - 1,
            deadline: self.policy.deadline(self.clock.now()),
            transport: if self.use_tcp {
                Transport::Tcp
            } else {
                Transport::Udp
            },
            fd: None,
            state: QueryState::Created,
            sink,
        };
        debug!(id, name = %name, record_type = %record_type, server = query.server, "Query created");
        self.queries.insert(id, query);
        self.dispatch(id);
    }

    fn dispatch(&mut self, id: u16) {
        loop {
            let Some(query) = self.queries.get_mut(&id) else {
                return;
            };
            if self.servers.is_empty() {
                self.finish(id, Err(ResolveError::NoServers));
                return;
            }
            let server = self.servers[query.server % self.servers.len()];
            query.state = QueryState::Sent;
            query.deadline = self.policy.deadline(self.clock.now());

            match self
                .multiplexer
                .send(server.addr(), query.transport, id, &query.message)
            {
                Ok(fd) => {
                    query.fd = Some(fd);
                    query.state = QueryState::Waiting;
                    return;
                }
                Err(e) => {
                    if !self.on_attempt_failed(id, e) {
                        return;
                    }
                }
            }
        }
    }

    /// Applies the retry policy after a failed attempt. Returns `true` when
    /// the query should be dispatched again.
    fn on_attempt_failed(&mut self, id: u16, error: ResolveError) -> bool {
        let Some(query) = self.queries.get_mut(&id) else {
            return false;
        };
        if let Some(fd) = query.fd.take() {
            self.multiplexer.release(fd, id);
        }

        let decision = self.policy.on_failure(
            &error,
            query.remaining,
            query.server,
            self.servers.len(),
            &self.selector,
        );
        match decision {
            RetryDecision::Retry { server } => {
                query.remaining -= 1;
                query.server = server;
                query.state = QueryState::Retrying;
                debug!(id, server, remaining = query.remaining, error = %error, "Retrying query");
                true
            }
            RetryDecision::GiveUp => {
                self.finish(id, Err(error));
                false
            }
        }
    }

    fn on_message(&mut self, fd: SocketFd, bytes: &[u8]) {
        let Some(id) = ResponseParser::peek_id(bytes) else {
            debug!(fd, len = bytes.len(), "Dropping short message");
            return;
        };
        let Some(query) = self.queries.get_mut(&id) else {
            debug!(fd, id, "Dropping response for unknown query");
            return;
        };
        if query.fd != Some(fd) {
            debug!(fd, id, "Dropping response from stale socket");
            return;
        }

        let accept_truncated = self.ignore_truncation || query.transport == Transport::Tcp;
        match ResponseParser::parse(bytes, id, &query.name, query.record_type, accept_truncated) {
            Ok(ParsedResponse::Answer(message)) => self.finish(id, Ok(message)),
            Ok(ParsedResponse::QuestionMismatch) => {
                debug!(fd, id, name = %query.name, "Ignoring response to a different question");
            }
            Ok(ParsedResponse::Truncated) => {
                if let Some(fd) = query.fd.take() {
                    self.multiplexer.release(fd, id);
                }
                query.transport = Transport::Tcp;
                debug!(id, name = %query.name, "Truncated response, retrying over TCP");
                self.dispatch(id);
            }
            Err(e) => {
                if self.on_attempt_failed(id, e) {
                    self.dispatch(id);
                }
            }
        }
    }

    fn expire(&mut self) {
        let now = self.clock.now();
        let expired: SmallVec<[u16; 8]> = self
            .queries
            .values()
            .filter(|q| q.deadline <= now)
            .map(|q| q.id)
            .collect();
        for id in expired {
            debug!(id, "Query attempt timed out");
            if self.on_attempt_failed(id, ResolveError::Timeout) {
                self.dispatch(id);
            }
        }
    }

    fn finish(&mut self, id: u16, outcome: Result<Message, ResolveError>) {
        let Some(mut query) = self.queries.remove(&id) else {
            return;
        };
        if let Some(fd) = query.fd.take() {
            self.multiplexer.release(fd, id);
        }
        debug!(
            id,
            name = %query.name,
            record_type = %query.record_type,
            ok = outcome.is_ok(),
            "Query completed"
        );
        self.complete(query.record_type, query.sink, outcome);
    }

    fn complete(
        &mut self,
        record_type: RecordType,
        sink: Sink,
        outcome: Result<Message, ResolveError>,
    ) {
        match sink {
            Sink::Records(callback) => {
                let result = outcome.and_then(|m| RecordExtractor::records(&m, record_type));
                self.ready.push_back(Completion::Query(callback, result));
            }
            Sink::Lookup(lookup_id) => self.advance_lookup(lookup_id, record_type, outcome),
        }
    }

    fn advance_lookup(
        &mut self,
        lookup_id: LookupId,
        record_type: RecordType,
        outcome: Result<Message, ResolveError>,
    ) {
        let Some(lookup) = self.lookups.remove(&lookup_id) else {
            return;
        };
        match lookup {
            Lookup::HostByName(state) => {
                let result =
                    outcome.and_then(|m| RecordExtractor::host(&m, &state.name, record_type));
                match state.absorb(result) {
                    Ok(completion) => self.ready.push_back(completion),
                    Err(pending) => {
                        self.lookups.insert(lookup_id, Lookup::HostByName(pending));
                    }
                }
            }
            Lookup::HostByAddr { address, callback } => {
                let result = outcome.and_then(|m| RecordExtractor::reverse_host(&m, address));
                self.ready.push_back(Completion::Host(callback, result));
            }
            Lookup::NameInfo {
                address,
                flags,
                service,
                callback,
            } => {
                let ip = address.ip();
                let result = outcome.and_then(|m| RecordExtractor::reverse_host(&m, ip));
                let result = lookup::node_name(result, ip, flags).map(|node| NameInfo {
                    node: Some(node),
                    service,
                });
                self.ready.push_back(Completion::NameInfo(callback, result));
            }
        }
    }

    fn deliver(&mut self) {
        while let Some(completion) = self.ready.pop_front() {
            completion.fire();
        }
    }
}
