use std::fmt;
use std::net::IpAddr;

use crate::ResolveError;

/// Address family requested from a forward lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressFamily {
    /// Both IPv4 and IPv6.
    #[default]
    Unspec,
    Inet,
    Inet6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Unspec => "unspec",
            AddressFamily::Inet => "inet",
            AddressFamily::Inet6 => "inet6",
        }
    }

    /// Maps the platform `AF_*` constants used by socket APIs.
    pub fn from_raw(family: i32, inet: i32, inet6: i32) -> Result<Self, ResolveError> {
        match family {
            0 => Ok(AddressFamily::Unspec),
            f if f == inet => Ok(AddressFamily::Inet),
            f if f == inet6 => Ok(AddressFamily::Inet6),
            _ => Err(ResolveError::BadFamily),
        }
    }

    pub fn matches(&self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::Unspec => true,
            AddressFamily::Inet => addr.is_ipv4(),
            AddressFamily::Inet6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a forward (`gethostbyname`) or reverse (`gethostbyaddr`) lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Canonical name.
    pub name: String,
    pub aliases: Vec<String>,
    pub addresses: Vec<IpAddr>,
}

impl HostEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            addresses: Vec::new(),
        }
    }

    pub fn with_addresses(mut self, addresses: Vec<IpAddr>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn push_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if alias != self.name && !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
    }

    pub fn push_address(&mut self, addr: IpAddr) {
        if !self.addresses.contains(&addr) {
            self.addresses.push(addr);
        }
    }
}
