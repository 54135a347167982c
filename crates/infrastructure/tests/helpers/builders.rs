#![allow(dead_code)]
use ferrous_resolv_application::ports::{Clock, EventSource, NO_SOCKET};
use ferrous_resolv_domain::{ChannelConfig, ResolveError};
use ferrous_resolv_infrastructure::Channel;
use rustc_hash::FxHashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub type Outcomes<T> = Arc<Mutex<Vec<Result<T, ResolveError>>>>;

/// Shared outcome list plus a callback appending to it.
pub fn recorder<T: Send + 'static>(
) -> (Outcomes<T>, impl FnOnce(Result<T, ResolveError>) + Send + 'static) {
    let outcomes: Outcomes<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    (outcomes, move |result| sink.lock().unwrap().push(result))
}

/// The single recorded outcome; panics unless exactly one was recorded.
pub fn single<T: Clone>(outcomes: &Outcomes<T>) -> Result<T, ResolveError> {
    let seen = outcomes.lock().unwrap();
    assert_eq!(seen.len(), 1, "expected exactly one callback");
    seen[0].clone()
}

pub struct ConfigBuilder {
    config: ChannelConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ChannelConfig::default().with_timeout(0.5).with_tries(2),
        }
    }

    pub fn server(mut self, addr: SocketAddr) -> Self {
        self.config.servers.push(addr.to_string());
        self
    }

    pub fn timeout(mut self, secs: f64) -> Self {
        self.config.timeout = secs;
        self
    }

    pub fn tries(mut self, tries: u32) -> Self {
        self.config.tries = tries;
        self
    }

    pub fn rotate(mut self) -> Self {
        self.config.rotate = true;
        self
    }

    pub fn use_tcp(mut self) -> Self {
        self.config.use_tcp = true;
        self
    }

    pub fn ignore_truncation(mut self) -> Self {
        self.config.ignore_truncation = true;
        self
    }

    pub fn build(self) -> ChannelConfig {
        self.config
    }

    pub fn channel(self) -> Channel {
        Channel::new(&self.config).unwrap()
    }
}

/// Test clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

/// Runs a `poll(2)` loop over the channel until it reports no timeout.
pub fn drive(channel: &mut Channel, limit: Duration) {
    let started = Instant::now();
    while let Some(timeout) = channel.timeout() {
        assert!(
            started.elapsed() < limit,
            "channel still busy after {:?}",
            limit
        );
        poll_once(channel, timeout.min(Duration::from_millis(50)));
    }
}

/// One wait on the channel's sockets followed by the matching process calls.
pub fn poll_once(channel: &mut Channel, wait: Duration) {
    let interest = channel.getsock();
    let mut events: FxHashMap<i32, libc::c_short> = FxHashMap::default();
    for fd in &interest.readable {
        *events.entry(*fd).or_default() |= libc::POLLIN;
    }
    for fd in &interest.writable {
        *events.entry(*fd).or_default() |= libc::POLLOUT;
    }
    let mut fds: Vec<libc::pollfd> = events
        .into_iter()
        .map(|(fd, events)| libc::pollfd {
            fd,
            events,
            revents: 0,
        })
        .collect();

    // SAFETY: `fds` is a valid, exclusively borrowed array of pollfd.
    let ready = unsafe {
        libc::poll(
            fds.as_mut_ptr(),
            fds.len() as libc::nfds_t,
            wait.as_millis() as libc::c_int,
        )
    };

    if ready <= 0 {
        channel.process().unwrap();
        return;
    }
    for pfd in &fds {
        if pfd.revents == 0 {
            continue;
        }
        let read = if pfd.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0 {
            pfd.fd
        } else {
            NO_SOCKET
        };
        let write = if pfd.revents & libc::POLLOUT != 0 {
            pfd.fd
        } else {
            NO_SOCKET
        };
        channel.process_fd(read, write).unwrap();
    }
}
