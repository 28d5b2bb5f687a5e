//! Late-response guarding
//!
//! Every fetch that feeds a piece of view state takes a ticket first. When the
//! response arrives, it is only applied if no newer ticket was issued in the
//! meantime, so a slow response to an old selection cannot overwrite the
//! state produced by a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Monotonic request counter, cheap to clone and share between tasks
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    latest: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// `Some(value)` if `ticket` is still the newest, `None` otherwise
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!("discarding stale response for request #{}", ticket.0);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = RequestGeneration::new();
        let first = generation.issue();
        let second = generation.issue();

        assert!(first < second);
        assert_eq!(generation.accept(first, "old"), None);
        assert_eq!(generation.accept(second, "new"), Some("new"));
    }

    #[test]
    fn clones_share_the_counter() {
        let generation = RequestGeneration::new();
        let ticket = generation.issue();
        generation.clone().issue();
        assert!(!generation.is_current(ticket));
    }
}
