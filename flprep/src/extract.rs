//! Simplified formula and forced literals after preprocessing.
use std::io;

use partial_ref::{partial, PartialRef};

use crate::cnf::CnfFormula;
use crate::context::{AssignmentP, ClauseStoreP, Context, PreprocessStateP, TrailP};
use crate::dimacs::write_dimacs;
use crate::lit::Lit;
use crate::state::Unsat;

/// Result of preprocessing a formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Set when the formula was found to be inconsistent.
    pub unsat: Option<Unsat>,
    pub var_count: usize,
    /// One literal per permanently assigned variable, ordered by variable.
    pub forced: Vec<Lit>,
    /// Clauses not satisfied by `forced`, with false literals removed, in input order.
    pub simplified: CnfFormula,
}

impl Outcome {
    pub fn is_inconsistent(&self) -> bool {
        self.unsat.is_some()
    }

    /// The simplified formula followed by one unit clause per forced literal.
    ///
    /// An inconsistent formula is replaced by `p cnf 1 2 / -1 0 / 1 0`.
    pub fn to_formula(&self) -> CnfFormula {
        if self.is_inconsistent() {
            let mut witness = CnfFormula::with_var_count(1);
            witness.add_clause(&[Lit::from_dimacs(-1)]);
            witness.add_clause(&[Lit::from_dimacs(1)]);
            return witness;
        }

        let mut formula = self.simplified.clone();
        formula.set_var_count(self.var_count);
        for &lit in self.forced.iter() {
            formula.add_clause(&[lit]);
        }
        formula
    }

    /// Write the output formula in DIMACS CNF format.
    pub fn write_dimacs(&self, target: &mut impl io::Write) -> io::Result<()> {
        write_dimacs(target, &self.to_formula())
    }
}

/// Collect the outcome from the final assignment.
pub fn extract(
    ctx: partial!(Context, AssignmentP, ClauseStoreP, PreprocessStateP, TrailP),
) -> Outcome {
    let store = ctx.part(ClauseStoreP);
    let var_count = store.var_count();

    let unsat = ctx.part(PreprocessStateP).unsat;
    if unsat.is_some() {
        return Outcome {
            unsat,
            var_count,
            forced: vec![],
            simplified: CnfFormula::with_var_count(var_count),
        };
    }

    let assignment = ctx.part(AssignmentP);

    // Without an outstanding decision the trail holds exactly the permanent assignments.
    let mut forced = ctx.part(TrailP).trail().to_vec();
    forced.sort_unstable_by_key(|lit| lit.index());

    let mut simplified = CnfFormula::with_var_count(var_count);
    for clause in store.iter() {
        if clause.iter().any(|&lit| assignment.lit_is_true(lit)) {
            continue;
        }
        simplified.add_clause(
            clause
                .iter()
                .cloned()
                .filter(|&lit| !assignment.lit_is_false(lit)),
        );
    }

    Outcome {
        unsat,
        var_count,
        forced,
        simplified,
    }
}
