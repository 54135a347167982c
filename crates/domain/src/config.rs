pub mod channel;
pub mod errors;
pub mod hosts;
pub mod logging;

pub use channel::{ChannelConfig, FALLBACK_SERVERS, MAX_TIMEOUT_SECS};
pub use errors::ConfigError;
pub use hosts::HostsEntry;
pub use logging::LoggingConfig;
