use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;
use super::hosts::{default_hosts, HostsEntry};
use super::logging::LoggingConfig;
use crate::nameserver::{Nameserver, DEFAULT_DNS_PORT};

/// Longest accepted per-attempt timeout, in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0;

/// Servers used when a channel is created without any.
pub const FALLBACK_SERVERS: [&str; 1] = ["127.0.0.1"];

/// Options recognised when a channel is constructed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChannelConfig {
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Attempts per query, counting the first send.
    #[serde(default = "default_tries")]
    pub tries: u32,

    /// Round-robin the starting server of each query.
    #[serde(default)]
    pub rotate: bool,

    #[serde(default)]
    pub servers: Vec<String>,

    #[serde(default = "default_port")]
    pub default_port: u16,

    /// Send every query over TCP.
    #[serde(default)]
    pub use_tcp: bool,

    /// Accept truncated UDP answers instead of retrying over TCP.
    #[serde(default)]
    pub ignore_truncation: bool,

    /// Clear the RD bit on outgoing queries.
    #[serde(default)]
    pub no_recursion: bool,

    /// Retire a UDP socket after this many queries; 0 keeps it forever.
    #[serde(default)]
    pub udp_max_queries: u32,

    #[serde(default = "default_hosts")]
    pub hosts: Vec<HostsEntry>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_timeout() -> f64 {
    2.0
}

fn default_tries() -> u32 {
    3
}

fn default_port() -> u16 {
    DEFAULT_DNS_PORT
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            tries: default_tries(),
            rotate: false,
            servers: Vec::new(),
            default_port: default_port(),
            use_tcp: false,
            ignore_truncation: false,
            no_recursion: false,
            udp_max_queries: 0,
            hosts: default_hosts(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ChannelConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout
            )));
        }
        if self.timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "timeout must not exceed {} seconds, got {}",
                MAX_TIMEOUT_SECS, self.timeout
            )));
        }
        if self.tries == 0 {
            return Err(ConfigError::Validation("tries must be at least 1".to_string()));
        }
        if self.default_port == 0 {
            return Err(ConfigError::Validation("default_port cannot be 0".to_string()));
        }
        self.nameservers()?;
        for entry in &self.hosts {
            if entry.names.is_empty() {
                return Err(ConfigError::InvalidHostsEntry(
                    entry.ip.clone(),
                    "at least one name is required".to_string(),
                ));
            }
            entry.ip.parse::<std::net::IpAddr>().map_err(|e| {
                ConfigError::InvalidHostsEntry(entry.ip.clone(), e.to_string())
            })?;
        }
        Ok(())
    }

    /// Per-attempt timeout, clamped to `(0, MAX_TIMEOUT_SECS]`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout.clamp(0.0, MAX_TIMEOUT_SECS))
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout()))
    }

    /// Parsed server list; falls back to [`FALLBACK_SERVERS`] when empty.
    pub fn nameservers(&self) -> Result<Vec<Nameserver>, ConfigError> {
        let raw: Vec<&str> = if self.servers.is_empty() {
            FALLBACK_SERVERS.to_vec()
        } else {
            self.servers.iter().map(String::as_str).collect()
        };
        raw.into_iter()
            .map(|s| {
                Nameserver::parse_with_port(s, self.default_port)
                    .map_err(|e| ConfigError::InvalidServer(s.to_string(), e.to_string()))
            })
            .collect()
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn with_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// Fills `servers` from caller-discovered defaults if none were given.
    pub fn with_default_servers<I, S>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.servers.is_empty() {
            self.servers = defaults.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn with_use_tcp(mut self, use_tcp: bool) -> Self {
        self.use_tcp = use_tcp;
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<HostsEntry>) -> Self {
        self.hosts = hosts;
        self
    }
}
