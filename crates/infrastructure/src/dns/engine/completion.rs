use ferrous_resolv_domain::{HostEntry, NameInfo, QueryResult, ResolveError};

pub type QueryCallback = Box<dyn FnOnce(Result<QueryResult, ResolveError>) + Send>;
pub type HostCallback = Box<dyn FnOnce(Result<HostEntry, ResolveError>) + Send>;
pub type NameInfoCallback = Box<dyn FnOnce(Result<NameInfo, ResolveError>) + Send>;

/// A terminal outcome waiting for the next processing pass.
pub(crate) enum Completion {
    Query(QueryCallback, Result<QueryResult, ResolveError>),
    Host(HostCallback, Result<HostEntry, ResolveError>),
    NameInfo(NameInfoCallback, Result<NameInfo, ResolveError>),
}

impl Completion {
    pub(crate) fn fire(self) {
        match self {
            Completion::Query(callback, result) => callback(result),
            Completion::Host(callback, result) => callback(result),
            Completion::NameInfo(callback, result) => callback(result),
        }
    }

    /// Delivers `Cancelled` instead of the stored outcome.
    pub(crate) fn cancel(self) {
        match self {
            Completion::Query(callback, _) => callback(Err(ResolveError::Cancelled)),
            Completion::Host(callback, _) => callback(Err(ResolveError::Cancelled)),
            Completion::NameInfo(callback, _) => callback(Err(ResolveError::Cancelled)),
        }
    }
}
