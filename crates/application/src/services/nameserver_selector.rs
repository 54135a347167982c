use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every query starts at the first server and walks the list in order.
    Failover,
    /// Each new query starts one server further than the previous one.
    Rotate,
}

/// Picks the nameserver index a query is sent to, initially and on retry.
pub struct NameserverSelector {
    mode: SelectionMode,
    counter: AtomicUsize,
}

impl NameserverSelector {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn from_rotate(rotate: bool) -> Self {
        Self::new(if rotate {
            SelectionMode::Rotate
        } else {
            SelectionMode::Failover
        })
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Server index for a freshly submitted query.
    pub fn initial(&self, server_count: usize) -> usize {
        if server_count == 0 {
            return 0;
        }
        match self.mode {
            SelectionMode::Failover => 0,
            SelectionMode::Rotate => {
                let index = self.counter.fetch_add(1, Ordering::Relaxed) % server_count;
                debug!(strategy = "rotate", servers = server_count, start_index = index, "Round-robin");
                index
            }
        }
    }

    /// Server index for the next attempt after `current` failed.
    pub fn next(&self, current: usize, server_count: usize) -> usize {
        if server_count == 0 {
            return 0;
        }
        (current + 1) % server_count
    }
}

impl Default for NameserverSelector {
    fn default() -> Self {
        Self::new(SelectionMode::Failover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failover_always_starts_at_first_server() {
        let selector = NameserverSelector::new(SelectionMode::Failover);
        assert_eq!(selector.initial(3), 0);
        assert_eq!(selector.initial(3), 0);
    }

    #[test]
    fn test_rotate_spreads_start_server() {
        let selector = NameserverSelector::from_rotate(true);
        let starts: Vec<usize> = (0..4).map(|_| selector.initial(3)).collect();
        assert_eq!(starts, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_next_wraps_around() {
        let selector = NameserverSelector::default();
        assert_eq!(selector.next(0, 3), 1);
        assert_eq!(selector.next(2, 3), 0);
        assert_eq!(selector.next(0, 1), 0);
    }

    #[test]
    fn test_empty_server_list() {
        let selector = NameserverSelector::from_rotate(true);
        assert_eq!(selector.initial(0), 0);
        assert_eq!(selector.next(0, 0), 0);
    }
}
