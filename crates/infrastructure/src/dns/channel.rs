use super::engine::{HostCallback, NameInfoCallback, QueryCallback, QueryEngine};
use crate::service_catalog::ServiceCatalog;
use crate::system::SystemClock;
use ferrous_resolv_application::ports::{
    Clock, EventSource, ServiceCatalogPort, SocketFd, SocketInterest, NO_SOCKET,
};
use ferrous_resolv_domain::{
    AddressFamily, ChannelConfig, ConfigError, HostEntry, NameInfo, NameInfoFlags, Nameserver,
    QueryResult, RecordType, ResolveError,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Asynchronous resolver handle driven by the caller's event loop.
///
/// Submitting a request never blocks and never invokes its callback; the
/// callback runs during a later [`EventSource::process_fd`] (or
/// [`Channel::cancel`] / [`Channel::destroy`]). Ask [`EventSource::getsock`]
/// which descriptors to wait on and [`EventSource::timeout`] how long.
pub struct Channel {
    engine: Option<QueryEngine>,
    default_port: u16,
}

impl Channel {
    pub fn new(config: &ChannelConfig) -> Result<Self, ConfigError> {
        Self::with_ports(
            config,
            Arc::new(SystemClock),
            Arc::new(ServiceCatalog::load()),
        )
    }

    /// Builds a channel on an explicit clock and service catalog.
    pub fn with_ports(
        config: &ChannelConfig,
        clock: Arc<dyn Clock>,
        catalog: Arc<dyn ServiceCatalogPort>,
    ) -> Result<Self, ConfigError> {
        let engine = QueryEngine::new(config, clock, catalog)?;
        info!(
            servers = ?engine.servers().iter().map(ToString::to_string).collect::<Vec<_>>(),
            timeout_secs = config.timeout,
            tries = config.tries,
            rotate = config.rotate,
            use_tcp = config.use_tcp,
            "DNS channel created"
        );
        Ok(Self {
            engine: Some(engine),
            default_port: config.default_port,
        })
    }

    fn engine(&mut self) -> Result<&mut QueryEngine, ResolveError> {
        self.engine.as_mut().ok_or(ResolveError::ChannelDestroyed)
    }

    pub fn query(
        &mut self,
        name: &str,
        record_type: RecordType,
        callback: impl FnOnce(Result<QueryResult, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        let callback: QueryCallback = Box::new(callback);
        self.engine()?.query(name, record_type, callback)
    }

    /// Like [`Channel::query`] with a numeric record type, rejected with
    /// `BadQuery` unless it is one of the supported types.
    pub fn query_raw(
        &mut self,
        name: &str,
        record_type: u16,
        callback: impl FnOnce(Result<QueryResult, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        let engine = self.engine()?;
        let record_type = RecordType::try_from(record_type)?;
        engine.query(name, record_type, Box::new(callback))
    }

    pub fn gethostbyname(
        &mut self,
        name: &str,
        family: AddressFamily,
        callback: impl FnOnce(Result<HostEntry, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        let callback: HostCallback = Box::new(callback);
        self.engine()?.gethostbyname(name, family, callback)
    }

    pub fn gethostbyaddr(
        &mut self,
        address: IpAddr,
        callback: impl FnOnce(Result<HostEntry, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        self.engine()?.gethostbyaddr(address, Box::new(callback));
        Ok(())
    }

    /// Textual form of [`Channel::gethostbyaddr`].
    pub fn gethostbyaddr_str(
        &mut self,
        address: &str,
        callback: impl FnOnce(Result<HostEntry, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        let engine = self.engine()?;
        let address: IpAddr = address
            .trim()
            .parse()
            .map_err(|_| ResolveError::BadQuery(format!("invalid IP address: {}", address)))?;
        engine.gethostbyaddr(address, Box::new(callback));
        Ok(())
    }

    pub fn getnameinfo(
        &mut self,
        address: SocketAddr,
        flags: NameInfoFlags,
        callback: impl FnOnce(Result<NameInfo, ResolveError>) + Send + 'static,
    ) -> Result<(), ResolveError> {
        let callback: NameInfoCallback = Box::new(callback);
        self.engine()?.getnameinfo(address, flags, callback)
    }

    /// Terminates every active request with `Cancelled`. Callbacks run before
    /// this returns. The channel stays usable.
    pub fn cancel(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel_all();
        }
    }

    /// Cancels everything, closes all sockets and makes further calls fail
    /// with `ChannelDestroyed`. Idempotent.
    pub fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            let cancelled = engine.cancel_all();
            debug!(cancelled, "DNS channel destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn servers(&self) -> Result<Vec<Nameserver>, ResolveError> {
        self.engine
            .as_ref()
            .map(|engine| engine.servers().to_vec())
            .ok_or(ResolveError::ChannelDestroyed)
    }

    /// Replaces the nameserver list. Queries already on the wire keep their
    /// socket; retries and new queries use the new list.
    pub fn set_servers(&mut self, servers: Vec<Nameserver>) -> Result<(), ResolveError> {
        self.engine()?.set_servers(servers);
        Ok(())
    }

    /// Parses `"ip[:port],ip,..."` and installs the result.
    pub fn set_servers_csv(&mut self, csv: &str) -> Result<(), ResolveError> {
        let servers = Nameserver::parse_csv(csv, self.default_port)?;
        self.set_servers(servers)
    }

    /// Requests with a callback still to run; zero once destroyed.
    pub fn active_queries(&self) -> usize {
        self.engine.as_ref().map_or(0, QueryEngine::active_queries)
    }

    /// A processing pass with no ready descriptors: timers and queued
    /// completions only.
    pub fn process(&mut self) -> Result<(), ResolveError> {
        self.process_fd(NO_SOCKET, NO_SOCKET)
    }

    /// [`EventSource::timeout`] clamped to `max`.
    pub fn timeout_bounded(&self, max: Duration) -> Duration {
        self.timeout().map_or(max, |t| t.min(max))
    }
}

impl EventSource for Channel {
    fn getsock(&self) -> SocketInterest {
        self.engine
            .as_ref()
            .map(QueryEngine::interest)
            .unwrap_or_default()
    }

    fn process_fd(&mut self, read_fd: SocketFd, write_fd: SocketFd) -> Result<(), ResolveError> {
        self.engine()?.process(read_fd, write_fd);
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.engine.as_ref().and_then(QueryEngine::timeout)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.destroy();
    }
}
