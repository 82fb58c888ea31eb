//! Preprocessing statistics.

/// Counters collected while preprocessing.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct Stats {
    /// Permanent assignments, including those implied by unit clauses.
    pub units: u64,
    /// Completed probing rounds.
    pub rounds: u64,
    /// Tentative decisions made while probing.
    pub decisions: u64,
    /// Propagated literals.
    pub propagations: u64,
    /// Probed literals that led to a conflict.
    pub failed_literals: u64,
}
