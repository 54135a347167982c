use serde::{Deserialize, Serialize};

/// Static host table line: one address, a canonical name and optional aliases.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HostsEntry {
    pub ip: String,

    pub names: Vec<String>,
}

impl HostsEntry {
    pub fn new(ip: impl Into<String>, names: &[&str]) -> Self {
        Self {
            ip: ip.into(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn canonical(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

pub(super) fn default_hosts() -> Vec<HostsEntry> {
    vec![
        HostsEntry::new("127.0.0.1", &["localhost"]),
        HostsEntry::new("::1", &["localhost"]),
    ]
}
