//! flprep is a [failed literal][fl] preprocessor for boolean formulas in
//! [conjunctive normal form][cnf].
//!
//! For every unassigned variable both polarities are tentatively assigned and propagated. A
//! polarity that leads to a conflict is a failed literal, so the opposite polarity is assigned
//! permanently. This is repeated until a full round finds no new failed literal. The result is an
//! equivalent formula without satisfied clauses and false literals, plus one unit clause per
//! permanently assigned variable.
//!
//! Long occurrence lists can be propagated using a [rayon] thread pool, see
//! [`PreprocessorConfig::threads`](config::PreprocessorConfig::threads).
//!
//! [fl]: https://en.wikipedia.org/wiki/Unit_propagation
//! [cnf]: https://en.wikipedia.org/wiki/Conjunctive_normal_form

pub mod config;
pub mod preprocessor;

mod clause;
mod context;
mod extract;
mod occurrences;
mod probe;
mod prop;
mod state;
mod stats;

pub use flprep_formula::{cnf, lit, CnfFormula, Lit, Var};

pub use clause::FormulaError;
pub use extract::Outcome;
pub use preprocessor::{preprocess, PreprocessError, Preprocessor};
pub use state::Unsat;
pub use stats::Stats;

pub mod dimacs {
    //! DIMACS CNF parser and writer.
    pub use flprep_dimacs::*;
}
