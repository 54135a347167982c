mod nameserver_selector;
mod retry_policy;

pub use nameserver_selector::{NameserverSelector, SelectionMode};
pub use retry_policy::{RetryDecision, RetryPolicy};
