use ferrous_resolv_domain::ResolveError;
use smallvec::SmallVec;
use std::time::Duration;

/// Raw descriptor handed to the caller's poller.
pub type SocketFd = std::os::fd::RawFd;

/// Placeholder passed to `process_fd` for "no descriptor ready".
pub const NO_SOCKET: SocketFd = -1;

/// Descriptors a caller should watch, split by readiness kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketInterest {
    pub readable: SmallVec<[SocketFd; 4]>,
    pub writable: SmallVec<[SocketFd; 4]>,
}

impl SocketInterest {
    pub fn is_empty(&self) -> bool {
        self.readable.is_empty() && self.writable.is_empty()
    }
}

/// Something an external event loop can drive: it reports interesting
/// descriptors, accepts readiness notifications and names the next timer.
///
/// Implementors never block and never own a loop of their own.
pub trait EventSource {
    fn getsock(&self) -> SocketInterest;

    /// Handles readiness of `read_fd` and/or `write_fd` (either may be
    /// [`NO_SOCKET`]) and then runs expired timers. Fails only when the
    /// source can no longer be driven.
    fn process_fd(&mut self, read_fd: SocketFd, write_fd: SocketFd) -> Result<(), ResolveError>;

    /// Time until the source next needs `process_fd`, or `None` when idle.
    fn timeout(&self) -> Option<Duration>;
}
