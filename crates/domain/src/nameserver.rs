use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::ResolveError;

pub const DEFAULT_DNS_PORT: u16 = 53;

/// A resolver endpoint. UDP and TCP use the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nameserver {
    addr: SocketAddr,
}

impl Nameserver {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn from_ip(ip: IpAddr) -> Self {
        Self::new(SocketAddr::new(ip, DEFAULT_DNS_PORT))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Parses `ip`, `ip:port`, `[v6]` or `[v6]:port`; a missing port takes
    /// `default_port`.
    pub fn parse_with_port(s: &str, default_port: u16) -> Result<Self, ResolveError> {
        let s = s.trim();
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::new(addr));
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::new(SocketAddr::new(ip, default_port)));
        }
        if let Some((host, port)) = parse_host_port(s) {
            if let Ok(ip) = host.parse::<IpAddr>() {
                return Ok(Self::new(SocketAddr::new(ip, port)));
            }
        }
        if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            if let Ok(ip) = inner.parse::<IpAddr>() {
                return Ok(Self::new(SocketAddr::new(ip, default_port)));
            }
        }
        Err(ResolveError::BadQuery(format!(
            "Invalid nameserver '{}'. Expected IP, IP:PORT or [IPv6]:PORT",
            s
        )))
    }

    /// Parses a comma-separated server list.
    pub fn parse_csv(csv: &str, default_port: u16) -> Result<Vec<Self>, ResolveError> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::parse_with_port(s, default_port))
            .collect()
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        let port_str = rest.strip_prefix(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

impl FromStr for Nameserver {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_port(s, DEFAULT_DNS_PORT)
    }
}

impl From<SocketAddr> for Nameserver {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr)
    }
}

impl From<IpAddr> for Nameserver {
    fn from(ip: IpAddr) -> Self {
        Self::from_ip(ip)
    }
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.addr.port() == DEFAULT_DNS_PORT {
            write!(f, "{}", self.addr.ip())
        } else {
            write!(f, "{}", self.addr)
        }
    }
}
