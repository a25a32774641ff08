//! Score ledger
//!
//! +1 when an item's landing is announced, -1 (floored at 0) when an
//! adversary eats one. The stability judge never touches the score.

use std::collections::HashSet;

use super::stack::ItemId;
use crate::highscores::BestScoreStore;

/// Outcome of the end-of-session best-score check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestOutcome {
    pub previous: u32,
    pub best: u32,
    /// Final score strictly beat the stored best
    pub improved: bool,
}

#[derive(Debug, Default)]
pub struct ScoreLedger {
    score: u32,
    scored: HashSet<ItemId>,
    best_recorded: bool,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Credit a landed item. Idempotent per item.
    pub fn on_landed(&mut self, item: ItemId) -> bool {
        if self.scored.insert(item) {
            self.score += 1;
            true
        } else {
            false
        }
    }

    pub fn on_consumed(&mut self) {
        self.score = self.score.saturating_sub(1);
    }

    /// Compare against the stored best and persist on improvement.
    /// Only the first call per session does anything.
    pub fn record_best(&mut self, store: &mut dyn BestScoreStore, key: &str) -> Option<BestOutcome> {
        if self.best_recorded {
            return None;
        }
        self.best_recorded = true;

        let previous = store.best_score(key);
        let improved = self.score > previous;
        if improved {
            store.set_best_score(key, self.score);
        }
        Some(BestOutcome {
            previous,
            best: previous.max(self.score),
            improved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::BestScores;

    #[test]
    fn test_landing_credit_is_idempotent() {
        let mut ledger = ScoreLedger::new();
        assert!(ledger.on_landed(ItemId(1)));
        assert!(!ledger.on_landed(ItemId(1)));
        assert!(ledger.on_landed(ItemId(2)));
        assert_eq!(ledger.score(), 2);
    }

    #[test]
    fn test_consumption_floors_at_zero() {
        let mut ledger = ScoreLedger::new();
        ledger.on_landed(ItemId(1));
        ledger.on_consumed();
        ledger.on_consumed();
        assert_eq!(ledger.score(), 0);
    }

    #[test]
    fn test_best_updates_only_on_strict_improvement() {
        const KEY: &str = "pancake_best_normal";
        let mut store = BestScores::new();
        store.set_best_score(KEY, 2);

        let mut ledger = ScoreLedger::new();
        ledger.on_landed(ItemId(1));
        ledger.on_landed(ItemId(2));
        let outcome = ledger.record_best(&mut store, KEY).expect("first call");
        assert!(!outcome.improved);
        assert_eq!(store.best_score(KEY), 2);

        let mut ledger = ScoreLedger::new();
        for id in 1..=3 {
            ledger.on_landed(ItemId(id));
        }
        let outcome = ledger.record_best(&mut store, KEY).expect("first call");
        assert!(outcome.improved);
        assert_eq!(outcome.previous, 2);
        assert_eq!(store.best_score(KEY), 3);
        // Written once per session
        assert_eq!(ledger.record_best(&mut store, KEY), None);
    }
}
