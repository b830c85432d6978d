//! Staleness control for cross-boundary fetches. Each fetch category keeps a
//! generation counter; a response is applied only if its ticket still
//! matches the current generation (last write wins by key, not by
//! completion order).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Availability,
    Quote,
    Promo,
}

/// Handed out when a fetch starts; checked when its response lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    kind: FetchKind,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct FetchTracker {
    generations: HashMap<FetchKind, u64>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch of this kind, superseding any in-flight one.
    pub fn begin(&mut self, kind: FetchKind) -> FetchTicket {
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        FetchTicket {
            kind,
            generation: *generation,
        }
    }

    /// Invalidate without starting a new fetch (an input changed).
    pub fn invalidate(&mut self, kind: FetchKind) {
        *self.generations.entry(kind).or_insert(0) += 1;
    }

    /// Whether a response carrying this ticket may still be applied.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.generations.get(&ticket.kind).copied().unwrap_or(0) == ticket.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_fetch_supersedes_older() {
        let mut tracker = FetchTracker::new();
        let first = tracker.begin(FetchKind::Quote);
        let second = tracker.begin(FetchKind::Quote);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut tracker = FetchTracker::new();
        let quote = tracker.begin(FetchKind::Quote);
        let availability = tracker.begin(FetchKind::Availability);
        tracker.invalidate(FetchKind::Availability);
        assert!(tracker.is_current(quote));
        assert!(!tracker.is_current(availability));
    }

    #[test]
    fn test_invalidate_discards_in_flight_response() {
        let mut tracker = FetchTracker::new();
        let ticket = tracker.begin(FetchKind::Promo);
        tracker.invalidate(FetchKind::Promo);
        assert!(!tracker.is_current(ticket));
    }
}
