//! Composite lookups built from one or more record queries.

use super::completion::{Completion, HostCallback, NameInfoCallback};
use ferrous_resolv_application::ports::ServiceCatalogPort;
use ferrous_resolv_domain::{HostEntry, NameInfoFlags, ResolveError};
use std::net::{IpAddr, SocketAddr};

pub(crate) type LookupId = u64;

pub(crate) enum Lookup {
    HostByName(HostByName),
    HostByAddr {
        address: IpAddr,
        callback: HostCallback,
    },
    NameInfo {
        address: SocketAddr,
        flags: NameInfoFlags,
        service: Option<String>,
        callback: NameInfoCallback,
    },
}

impl Lookup {
    pub(crate) fn cancel(self) {
        match self {
            Lookup::HostByName(state) => (state.callback)(Err(ResolveError::Cancelled)),
            Lookup::HostByAddr { callback, .. } => callback(Err(ResolveError::Cancelled)),
            Lookup::NameInfo { callback, .. } => callback(Err(ResolveError::Cancelled)),
        }
    }
}

/// Forward lookup over A and/or AAAA, merged into one host entry.
pub(crate) struct HostByName {
    pub(crate) name: String,
    outstanding: usize,
    entry: Option<HostEntry>,
    error: Option<ResolveError>,
    callback: HostCallback,
}

impl HostByName {
    pub(crate) fn new(name: impl Into<String>, outstanding: usize, callback: HostCallback) -> Self {
        Self {
            name: name.into(),
            outstanding,
            entry: None,
            error: None,
            callback,
        }
    }

    /// Folds in the outcome of one address query. Returns the completion
    /// once every query has reported.
    pub(crate) fn absorb(mut self, result: Result<HostEntry, ResolveError>) -> Result<Completion, Self> {
        match result {
            Ok(found) => match &mut self.entry {
                Some(entry) => {
                    for alias in found.aliases {
                        entry.push_alias(alias);
                    }
                    for addr in found.addresses {
                        entry.push_address(addr);
                    }
                }
                None => self.entry = Some(found),
            },
            Err(e) => {
                // NODATA on one family is weaker than any other failure.
                if self.error.is_none() || self.error == Some(ResolveError::NoData) {
                    self.error = Some(e);
                }
            }
        }
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding > 0 {
            return Err(self);
        }

        let result = match self.entry {
            Some(entry) => Ok(entry),
            None => Err(self.error.unwrap_or(ResolveError::NoData)),
        };
        Ok(Completion::Host(self.callback, result))
    }
}

/// Node part of a name-info answer, given the reverse lookup outcome.
pub(crate) fn node_name(
    result: Result<HostEntry, ResolveError>,
    ip: IpAddr,
    flags: NameInfoFlags,
) -> Result<String, ResolveError> {
    match result {
        Ok(entry) => Ok(strip_domain(entry.name, flags)),
        Err(ResolveError::NoData) if flags.contains(NameInfoFlags::NAMEREQD) => {
            Err(ResolveError::NotFound)
        }
        Err(e) if flags.contains(NameInfoFlags::NAMEREQD) => Err(e),
        Err(_) => Ok(ip.to_string()),
    }
}

/// Applies `NOFQDN`: only the first label of the host name is kept.
pub(crate) fn strip_domain(name: String, flags: NameInfoFlags) -> String {
    if !flags.contains(NameInfoFlags::NOFQDN) {
        return name;
    }
    match name.split_once('.') {
        Some((host, _)) if !host.is_empty() => host.to_string(),
        _ => name,
    }
}

/// Service part of a name-info answer.
pub(crate) fn service_name(
    catalog: &dyn ServiceCatalogPort,
    port: u16,
    flags: NameInfoFlags,
) -> String {
    if flags.contains(NameInfoFlags::NUMERICSERV) {
        return port.to_string();
    }
    catalog
        .service_name(port, flags.protocol())
        .unwrap_or_else(|| port.to_string())
}
