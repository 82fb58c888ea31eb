//! Counter updates for one propagated literal, optionally split across a thread pool.
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use flprep_formula::lit::LitIdx;

use crate::clause::ClauseIdx;
use crate::config::PreprocessorConfig;

/// Thread pool used to split long occurrence lists.
pub struct Workers {
    pool: Option<ThreadPool>,
    grain: usize,
}

impl Default for Workers {
    fn default() -> Workers {
        Workers {
            pool: None,
            grain: PreprocessorConfig::default().fanout_grain,
        }
    }
}

impl Workers {
    /// Build the pool for the configured number of threads.
    ///
    /// A single thread uses no pool at all.
    pub fn configure(&mut self, config: &PreprocessorConfig) -> Result<(), ThreadPoolBuildError> {
        self.grain = config.fanout_grain;
        self.pool = if config.threads > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(config.threads)
                    .thread_name(|index| format!("flprep-sweep-{}", index))
                    .build()?,
            )
        } else {
            None
        };
        Ok(())
    }
}

/// Clauses affected by a sweep.
#[derive(Default, Debug, Eq, PartialEq)]
pub struct Sweep {
    /// First clause, in occurrence order, whose counter reached zero.
    pub falsified: Option<ClauseIdx>,
    /// Clauses whose counter reached one, in occurrence order.
    pub near_unit: Vec<ClauseIdx>,
}

impl Sweep {
    fn append(&mut self, mut right: Sweep) {
        if self.falsified.is_none() {
            self.falsified = right.falsified;
        }
        self.near_unit.append(&mut right.near_unit);
    }
}

/// Decrement the counter of every listed clause.
///
/// `clauses` must be ascending. The result does not depend on whether and how the list was
/// split.
pub fn sweep(workers: &Workers, counts: &mut [LitIdx], clauses: &[ClauseIdx]) -> Sweep {
    match &workers.pool {
        Some(pool) if clauses.len() >= workers.grain => {
            let grain = workers.grain.max(2);
            pool.install(|| sweep_split(grain, counts, 0, clauses))
        }
        _ => sweep_serial(counts, 0, clauses),
    }
}

/// Sweep with `counts` holding the counters of clauses `base..`.
fn sweep_serial(counts: &mut [LitIdx], base: usize, clauses: &[ClauseIdx]) -> Sweep {
    let mut result = Sweep::default();
    for &clause in clauses {
        let count = &mut counts[clause as usize - base];
        debug_assert!(*count > 0);
        *count -= 1;
        match *count {
            0 => {
                if result.falsified.is_none() {
                    result.falsified = Some(clause);
                }
            }
            1 => result.near_unit.push(clause),
            _ => (),
        }
    }
    result
}

fn sweep_split(grain: usize, counts: &mut [LitIdx], base: usize, clauses: &[ClauseIdx]) -> Sweep {
    if clauses.len() < grain {
        return sweep_serial(counts, base, clauses);
    }

    // Repeated entries of one clause must end up on the same side.
    let mut mid = clauses.len() / 2;
    while mid < clauses.len() && clauses[mid] == clauses[mid - 1] {
        mid += 1;
    }
    if mid == clauses.len() {
        return sweep_serial(counts, base, clauses);
    }

    let right_base = clauses[mid] as usize;
    let (left_counts, right_counts) = counts.split_at_mut(right_base - base);
    let (left_clauses, right_clauses) = clauses.split_at(mid);

    let (mut left, right) = rayon::join(
        || sweep_split(grain, left_counts, base, left_clauses),
        || sweep_split(grain, right_counts, right_base, right_clauses),
    );

    left.append(right);
    left
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{collection, prelude::*};

    fn parallel_workers(grain: usize) -> Workers {
        let mut workers = Workers::default();
        workers
            .configure(&PreprocessorConfig {
                threads: 4,
                fanout_grain: grain,
            })
            .unwrap();
        workers
    }

    fn counters_and_list() -> impl Strategy<Value = (Vec<LitIdx>, Vec<ClauseIdx>)> {
        (1..200usize).prop_flat_map(|clause_count| {
            (
                collection::vec(0..clause_count as ClauseIdx, 0..400),
                collection::vec(0..3 as LitIdx, clause_count),
            )
                .prop_map(|(mut list, mut counts)| {
                    list.sort();
                    for &clause in list.iter() {
                        counts[clause as usize] += 1;
                    }
                    (counts, list)
                })
        })
    }

    #[test]
    fn reports_first_falsified_and_near_units() {
        let mut counts = vec![3, 1, 2, 2, 1];
        let result = sweep(&Workers::default(), &mut counts, &[0, 1, 2, 3, 3, 4]);

        assert_eq!(counts, vec![2, 0, 1, 0, 0]);
        assert_eq!(
            result,
            Sweep {
                falsified: Some(1),
                near_unit: vec![2, 3],
            }
        );
    }

    proptest! {
        #[test]
        fn split_matches_serial(
            (counts, list) in counters_and_list(),
            grain in 1..20usize,
        ) {
            let workers = parallel_workers(grain);

            let mut serial_counts = counts.clone();
            let serial = sweep(&Workers::default(), &mut serial_counts, &list);

            let mut parallel_counts = counts;
            let parallel = sweep(&workers, &mut parallel_counts, &list);

            prop_assert_eq!(serial, parallel);
            prop_assert_eq!(serial_counts, parallel_counts);
        }
    }
}
