use std::collections::HashMap;
use std::net::IpAddr;

use crate::config::{ConfigError, HostsEntry};
use crate::{AddressFamily, HostEntry};

/// Static name/address table consulted before the network.
#[derive(Debug, Clone, Default)]
pub struct HostsTable {
    entries: Vec<(IpAddr, Vec<String>)>,
    by_name: HashMap<String, Vec<usize>>,
}

impl HostsTable {
    pub fn from_entries(entries: &[HostsEntry]) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for entry in entries {
            let ip: IpAddr = entry
                .ip
                .parse()
                .map_err(|e: std::net::AddrParseError| {
                    ConfigError::InvalidHostsEntry(entry.ip.clone(), e.to_string())
                })?;
            if entry.names.is_empty() {
                return Err(ConfigError::InvalidHostsEntry(
                    entry.ip.clone(),
                    "at least one name is required".to_string(),
                ));
            }
            let idx = table.entries.len();
            for name in &entry.names {
                table
                    .by_name
                    .entry(normalize(name))
                    .or_default()
                    .push(idx);
            }
            table.entries.push((ip, entry.names.clone()));
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forward lookup. Every matching line contributes its address; the
    /// canonical name is taken from the first matching line.
    pub fn lookup_name(&self, name: &str, family: AddressFamily) -> Option<HostEntry> {
        let indices = self.by_name.get(&normalize(name))?;
        let mut host: Option<HostEntry> = None;
        for &idx in indices {
            let (ip, names) = &self.entries[idx];
            if !family.matches(ip) {
                continue;
            }
            let entry = host.get_or_insert_with(|| HostEntry::new(names[0].clone()));
            for alias in &names[1..] {
                entry.push_alias(alias.clone());
            }
            entry.push_address(*ip);
        }
        host
    }

    /// Reverse lookup by exact address.
    pub fn lookup_addr(&self, addr: &IpAddr) -> Option<HostEntry> {
        let (ip, names) = self.entries.iter().find(|(ip, _)| ip == addr)?;
        let mut host = HostEntry::new(names[0].clone());
        for alias in &names[1..] {
            host.push_alias(alias.clone());
        }
        host.push_address(*ip);
        Some(host)
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
