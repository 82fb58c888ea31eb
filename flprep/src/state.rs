//! Miscellaneous preprocessor state.
use thiserror::Error;

use crate::clause::ClauseIdx;
use crate::lit::Lit;

/// Why a formula is inconsistent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Unsat {
    #[error("clause {clause} is empty")]
    EmptyClause { clause: usize },
    #[error("unit clause {clause} contradicts an earlier unit clause")]
    ContradictoryUnits { clause: ClauseIdx },
    #[error("propagating the unit clauses falsifies clause {clause}")]
    InitialPropagation { clause: ClauseIdx },
    #[error("assigning the negation of failed literal {lit} falsifies clause {clause} in round {round}")]
    FailedLiteralPropagation {
        round: u64,
        lit: Lit,
        clause: ClauseIdx,
    },
}

/// Progress of the preprocessor.
#[derive(Default)]
pub struct PreprocessState {
    pub loaded: bool,
    pub finished: bool,
    pub unsat: Option<Unsat>,
}
