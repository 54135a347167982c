mod completion;
mod lookup;
mod query;
mod query_engine;

pub use completion::{HostCallback, NameInfoCallback, QueryCallback};
pub use query::QueryState;
pub use query_engine::QueryEngine;
