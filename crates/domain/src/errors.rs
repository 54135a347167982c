use thiserror::Error;

/// Terminal outcome of a resolution that did not produce a result.
///
/// Variants raised synchronously at the call boundary are `BadQuery`,
/// `BadFamily`, `BadFlags` and `ChannelDestroyed`. Everything else is only
/// ever delivered through a completion callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Domain name not found (NXDOMAIN)")]
    NotFound,

    #[error("No records of the requested type")]
    NoData,

    #[error("Query timeout")]
    Timeout,

    #[error("Query cancelled")]
    Cancelled,

    #[error("Server failure (SERVFAIL)")]
    ServerFailure,

    #[error("Query refused by server")]
    Refused,

    #[error("Query not implemented by server")]
    NotImplemented,

    #[error("Server rejected query format (FORMERR)")]
    FormatError,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Malformed DNS response: {0}")]
    MalformedResponse(String),

    #[error("Bad query: {0}")]
    BadQuery(String),

    #[error("Unsupported address family")]
    BadFamily,

    #[error("Invalid name info flags")]
    BadFlags,

    #[error("No nameservers configured")]
    NoServers,

    #[error("Channel has been destroyed")]
    ChannelDestroyed,

    #[error("I/O error: {0}")]
    Io(String),
}

impl ResolveError {
    /// Errors after which the same query may be retried on another server.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResolveError::ServerFailure
                | ResolveError::Refused
                | ResolveError::NotImplemented
                | ResolveError::FormatError
                | ResolveError::ConnectionRefused
                | ResolveError::Io(_)
        )
    }

    /// Stable upper-case code, matching the names resolver libraries
    /// traditionally expose (`ENOTFOUND`, `ETIMEOUT`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::NotFound => "ENOTFOUND",
            ResolveError::NoData => "ENODATA",
            ResolveError::Timeout => "ETIMEOUT",
            ResolveError::Cancelled => "ECANCELLED",
            ResolveError::ServerFailure => "ESERVFAIL",
            ResolveError::Refused => "EREFUSED",
            ResolveError::NotImplemented => "ENOTIMP",
            ResolveError::FormatError => "EFORMERR",
            ResolveError::ConnectionRefused => "ECONNREFUSED",
            ResolveError::MalformedResponse(_) => "EBADRESP",
            ResolveError::BadQuery(_) => "EBADQUERY",
            ResolveError::BadFamily => "EBADFAMILY",
            ResolveError::BadFlags => "EBADFLAGS",
            ResolveError::NoServers => "ENOSERVER",
            ResolveError::ChannelDestroyed => "EDESTRUCTION",
            ResolveError::Io(_) => "EIO",
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::ConnectionRefused {
            ResolveError::ConnectionRefused
        } else {
            ResolveError::Io(err.to_string())
        }
    }
}
