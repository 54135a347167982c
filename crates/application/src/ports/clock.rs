use std::time::Instant;

/// Monotonic time source used for query deadlines.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
