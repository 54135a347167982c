//! Ferrous Resolv Domain Layer
pub mod config;
pub mod dns_record;
pub mod errors;
pub mod host_entry;
pub mod hosts_table;
pub mod name_info;
pub mod nameserver;
pub mod reverse;

pub use config::{ChannelConfig, ConfigError, HostsEntry, LoggingConfig};
pub use dns_record::{
    AddressRecord, CnameRecord, MxRecord, NaptrRecord, NsRecord, PtrRecord, QueryResult,
    RecordType, SoaRecord, SrvRecord, TxtRecord,
};
pub use errors::ResolveError;
pub use host_entry::{AddressFamily, HostEntry};
pub use hosts_table::HostsTable;
pub use name_info::{NameInfo, NameInfoFlags};
pub use nameserver::{Nameserver, DEFAULT_DNS_PORT};
pub use reverse::{reverse_address, reverse_address_str};
