//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::ops::Range;

use crate::lit::Lit;

/// A formula in conjunctive normal form.
///
/// Behaves like a `Vec<Vec<Lit>>` but keeps all literals in one buffer. Clauses are kept in
/// insertion order and are never reordered or deduplicated; empty clauses are allowed.
#[derive(Default, Clone, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// An empty formula over `var_count` variables.
    pub fn with_var_count(var_count: usize) -> CnfFormula {
        CnfFormula {
            var_count,
            ..CnfFormula::default()
        }
    }

    /// Number of variables.
    ///
    /// At least one more than the largest variable index used by any clause, possibly more when
    /// raised with [`set_var_count`](CnfFormula::set_var_count).
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Raises the variable count to `count`; smaller values are ignored.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Total number of literal occurrences over all clauses.
    pub fn lit_count(&self) -> usize {
        self.literals.len()
    }

    /// Appends a clause.
    ///
    /// Accepts any iterator over `Lit` or `&Lit`.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        if let Some(top) = self.literals[begin..end].iter().map(|lit| lit.index()).max() {
            self.var_count = max(self.var_count, top + 1);
        }

        self.clause_ranges.push(begin..end);
    }

    /// The clause with the given position.
    pub fn clause(&self, index: usize) -> &[Lit] {
        &self.literals[self.clause_ranges[index].clone()]
    }

    /// Iterator over all clauses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }
}

/// Collects any iterable of literal iterables.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} vars ", self.var_count)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count == other.var_count
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Random formulas with exactly `vars` variables declared.
    ///
    /// Every clause draws its literals independently, so tautologies, duplicated literals and
    /// (for an empty `clause_len` range starting at 0) empty clauses all occur.
    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // Independent flat map, shrinking each clause on its own is too slow otherwise.
        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars.max(1)), clause_len.clone()),
                clauses.clone(),
            )
            .prop_map(move |clauses| {
                let mut formula = CnfFormula::from(clauses);
                formula.set_var_count(vars);
                formula
            })
        })
    }
}
