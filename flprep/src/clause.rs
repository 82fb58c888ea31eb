//! Immutable clause storage.
use thiserror::Error;

use flprep_formula::{lit::LitIdx, CnfFormula, Lit, Var};

/// Index of a clause in input order.
pub type ClauseIdx = LitIdx;

/// A formula that cannot be loaded.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum FormulaError {
    #[error("clause {clause}: literal {lit} exceeds the variable count {var_count}")]
    LiteralOutOfRange {
        clause: usize,
        lit: isize,
        var_count: usize,
    },
    #[error("clause {clause}: 0 is not a literal")]
    ZeroLiteral { clause: usize },
    #[error("variable count {var_count} exceeds the supported maximum of {max}")]
    TooManyVariables { var_count: usize, max: usize },
    #[error("clause count exceeds the supported maximum of {max}")]
    TooManyClauses { max: usize },
}

/// The clauses of the loaded formula.
///
/// Never modified after loading. Clause indices are positions in the input, which keeps the
/// output in input order.
#[derive(Default)]
pub struct ClauseStore {
    clauses: CnfFormula,
}

impl ClauseStore {
    /// Check and store the clauses of a formula over `var_count` variables.
    pub fn load<'a>(
        var_count: usize,
        clauses: impl IntoIterator<Item = &'a [Lit]>,
    ) -> Result<ClauseStore, FormulaError> {
        if var_count > Var::max_count() {
            return Err(FormulaError::TooManyVariables {
                var_count,
                max: Var::max_count(),
            });
        }

        let mut store = ClauseStore {
            clauses: CnfFormula::with_var_count(var_count),
        };

        for (index, clause) in clauses.into_iter().enumerate() {
            if let Some(&lit) = clause.iter().find(|lit| lit.index() >= var_count) {
                return Err(FormulaError::LiteralOutOfRange {
                    clause: index,
                    lit: lit.to_dimacs(),
                    var_count,
                });
            }
            store.push(clause)?;
        }

        Ok(store)
    }

    /// Check and store clauses given as signed DIMACS integers.
    pub fn load_dimacs_ints(
        var_count: usize,
        clauses: &[Vec<isize>],
    ) -> Result<ClauseStore, FormulaError> {
        if var_count > Var::max_count() {
            return Err(FormulaError::TooManyVariables {
                var_count,
                max: Var::max_count(),
            });
        }

        let mut store = ClauseStore {
            clauses: CnfFormula::with_var_count(var_count),
        };

        let mut lits = vec![];

        for (index, clause) in clauses.iter().enumerate() {
            lits.clear();
            for &number in clause.iter() {
                if number == 0 {
                    return Err(FormulaError::ZeroLiteral { clause: index });
                }
                if number.unsigned_abs() > var_count {
                    return Err(FormulaError::LiteralOutOfRange {
                        clause: index,
                        lit: number,
                        var_count,
                    });
                }
                lits.push(Lit::from_dimacs(number));
            }
            store.push(&lits)?;
        }

        Ok(store)
    }

    fn push(&mut self, clause: &[Lit]) -> Result<(), FormulaError> {
        let max = LitIdx::max_value() as usize;
        if self.clauses.len() >= max {
            return Err(FormulaError::TooManyClauses { max });
        }
        self.clauses.add_clause(clause);
        Ok(())
    }

    pub fn var_count(&self) -> usize {
        self.clauses.var_count()
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clause(&self, index: ClauseIdx) -> &[Lit] {
        self.clauses.clause(index as usize)
    }

    /// All clauses in input order.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses.iter()
    }

    /// Total number of literal occurrences.
    pub fn lit_count(&self) -> usize {
        self.clauses.lit_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flprep_formula::{cnf, lits};

    #[test]
    fn rejects_out_of_range_literals() {
        let clauses = cnf![
            1, 2;
            -3, 1;
        ];
        let result = ClauseStore::load(2, clauses.iter().cloned());
        assert_eq!(
            result.err(),
            Some(FormulaError::LiteralOutOfRange {
                clause: 1,
                lit: -3,
                var_count: 2
            })
        );
    }

    #[test]
    fn rejects_malformed_ints() {
        assert_eq!(
            ClauseStore::load_dimacs_ints(3, &[vec![1, 2], vec![3, 0, 1]]).err(),
            Some(FormulaError::ZeroLiteral { clause: 1 })
        );
        assert_eq!(
            ClauseStore::load_dimacs_ints(3, &[vec![-4]]).err(),
            Some(FormulaError::LiteralOutOfRange {
                clause: 0,
                lit: -4,
                var_count: 3
            })
        );
        assert!(matches!(
            ClauseStore::load_dimacs_ints(Var::max_count() + 1, &[]),
            Err(FormulaError::TooManyVariables { .. })
        ));
    }

    #[test]
    fn keeps_input_order_and_unused_vars() {
        let store = ClauseStore::load_dimacs_ints(5, &[vec![1, -2], vec![], vec![2], vec![]])
            .unwrap();
        assert_eq!(store.var_count(), 5);
        assert_eq!(store.len(), 4);
        assert_eq!(store.lit_count(), 3);
        assert_eq!(store.clause(0), &lits![1, -2]);
        assert!(store.clause(1).is_empty());
    }
}
