//! Per-literal occurrence lists.
use flprep_formula::Lit;

use crate::clause::{ClauseIdx, ClauseStore};

/// For each literal the clauses containing it.
///
/// Lists are indexed by [`Lit::code`] and sorted by clause index. A clause containing a literal
/// several times is listed that many times, matching the per-clause counters which start at the
/// clause length.
#[derive(Default)]
pub struct Occurrences {
    lists: Vec<Vec<ClauseIdx>>,
}

impl Occurrences {
    /// Build the occurrence lists of all clauses in `store`.
    pub fn build(store: &ClauseStore) -> Occurrences {
        let mut counts = vec![0usize; store.var_count() * 2];
        for clause in store.iter() {
            for lit in clause {
                counts[lit.code()] += 1;
            }
        }

        let mut lists: Vec<Vec<ClauseIdx>> = counts
            .into_iter()
            .map(|count| Vec::with_capacity(count))
            .collect();

        for (index, clause) in store.iter().enumerate() {
            for lit in clause {
                lists[lit.code()].push(index as ClauseIdx);
            }
        }

        log::debug!(
            "connected {} literal occurrences of {} clauses",
            store.lit_count(),
            store.len()
        );

        Occurrences { lists }
    }

    /// Clauses containing `lit`, in ascending order.
    pub fn clauses_of(&self, lit: Lit) -> &[ClauseIdx] {
        &self.lists[lit.code()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use flprep_formula::{cnf::strategy::cnf_formula, lit, Var};

    #[test]
    fn lists_duplicates_once_per_occurrence() {
        let store =
            ClauseStore::load_dimacs_ints(3, &[vec![1, -2], vec![-2, 3, -2], vec![1]]).unwrap();
        let occurrences = Occurrences::build(&store);

        assert_eq!(occurrences.clauses_of(lit!(1)), &[0, 2]);
        assert_eq!(occurrences.clauses_of(lit!(-2)), &[0, 1, 1]);
        assert_eq!(occurrences.clauses_of(lit!(2)), &[] as &[ClauseIdx]);
        assert_eq!(occurrences.clauses_of(lit!(3)), &[1]);
    }

    proptest! {
        #[test]
        fn lists_match_clauses(formula in cnf_formula(1..30usize, 0..60, 0..6)) {
            let store = ClauseStore::load(formula.var_count(), formula.iter()).unwrap();
            let occurrences = Occurrences::build(&store);

            for var in Var::all(formula.var_count()) {
                for &lit in [var.positive(), var.negative()].iter() {
                    let list = occurrences.clauses_of(lit);
                    prop_assert!(list.windows(2).all(|pair| pair[0] <= pair[1]));

                    let expected: Vec<ClauseIdx> = formula
                        .iter()
                        .enumerate()
                        .flat_map(|(index, clause)| {
                            clause
                                .iter()
                                .filter(move |&&other| other == lit)
                                .map(move |_| index as ClauseIdx)
                        })
                        .collect();
                    prop_assert_eq!(list, &expected[..]);
                }
            }
        }
    }
}
