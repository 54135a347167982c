#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Invalid nameserver '{0}': {1}")]
    InvalidServer(String, String),

    #[error("Invalid hosts entry for '{0}': {1}")]
    InvalidHostsEntry(String, String),
}
