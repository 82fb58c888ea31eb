//! Per-clause counts of literals that are not false.
use flprep_formula::lit::LitIdx;

use crate::clause::{ClauseIdx, ClauseStore};

/// Number of literal occurrences per clause that were not falsified by a propagated literal.
///
/// A counter only changes when a literal is dequeued, so it can be larger than the number of
/// currently non-false literals while their negations are still queued.
#[derive(Default)]
pub struct NonFalse {
    counts: Vec<LitIdx>,
}

impl NonFalse {
    /// Start every counter at the length of its clause.
    pub fn reset(&mut self, store: &ClauseStore) {
        self.counts.clear();
        self.counts
            .extend(store.iter().map(|clause| clause.len() as LitIdx));
    }

    pub fn counts(&self) -> &[LitIdx] {
        &self.counts
    }

    pub fn counts_mut(&mut self) -> &mut [LitIdx] {
        &mut self.counts
    }

    /// Undo one sweep over `clauses`.
    pub fn restore(&mut self, clauses: &[ClauseIdx]) {
        for &clause in clauses {
            self.counts[clause as usize] += 1;
        }
    }
}
