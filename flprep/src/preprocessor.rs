//! Failed literal preprocessor.
use std::io;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use anyhow::Error;
use log::info;
use thiserror::Error;

use crate::clause::{ClauseStore, FormulaError};
use crate::cnf::CnfFormula;
use crate::config::{ConfigError, PreprocessorConfig, PreprocessorConfigUpdate};
use crate::context::{
    load_formula, ClauseStoreP, ConfigP, Context, PreprocessStateP, ScheduleP, StatsP, WorkersP,
};
use crate::dimacs::DimacsParser;
use crate::extract::{extract, Outcome};
use crate::lit::Var;
use crate::probe::{probe_rounds, propagate_units};
use crate::stats::Stats;

/// Errors returned by the preprocessor API.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("malformed formula: {0}")]
    MalformedFormula(#[from] FormulaError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("could not start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("the probe order must list each of the {var_count} variables exactly once")]
    InvalidProbeOrder { var_count: usize },
    #[error("no formula was loaded")]
    NotLoaded,
    #[error("a formula was already loaded")]
    AlreadyLoaded,
}

/// Simplifies a CNF formula by assigning the negation of every failed literal.
///
/// A literal is failed when assigning it and propagating leads to a conflict. Probing repeats
/// until a full round over all variables finds no new failed literal.
#[derive(Default)]
pub struct Preprocessor {
    ctx: Box<Context>,
}

impl Preprocessor {
    /// Create a preprocessor using the default configuration.
    pub fn new() -> Preprocessor {
        Preprocessor::default()
    }

    /// Create a preprocessor using the given configuration.
    pub fn with_config(config: &PreprocessorConfig) -> Result<Preprocessor, PreprocessError> {
        config.validate()?;
        let mut preprocessor = Preprocessor::new();
        {
            let mut ctx = preprocessor.ctx.into_partial_ref_mut();
            ctx.part_mut(WorkersP).configure(config)?;
            *ctx.part_mut(ConfigP) = config.clone();
        }
        Ok(preprocessor)
    }

    /// Change the configuration.
    pub fn config(&mut self, update: &PreprocessorConfigUpdate) -> Result<(), PreprocessError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        let mut config = ctx.part(ConfigP).clone();
        update.apply(&mut config)?;
        ctx.part_mut(WorkersP).configure(&config)?;
        *ctx.part_mut(ConfigP) = config;
        Ok(())
    }

    /// Load a formula over the variables `1..=var_count`.
    ///
    /// Only one formula can be loaded per preprocessor.
    pub fn load(&mut self, var_count: usize, formula: &CnfFormula) -> Result<(), PreprocessError> {
        self.check_unloaded()?;
        let store = ClauseStore::load(var_count, formula.iter())?;
        self.install(store);
        Ok(())
    }

    /// Load clauses given as signed DIMACS literals.
    pub fn load_dimacs_ints(
        &mut self,
        var_count: usize,
        clauses: &[Vec<isize>],
    ) -> Result<(), PreprocessError> {
        self.check_unloaded()?;
        let store = ClauseStore::load_dimacs_ints(var_count, clauses)?;
        self.install(store);
        Ok(())
    }

    /// Read and load a formula in DIMACS CNF format.
    pub fn load_dimacs(&mut self, input: impl io::Read) -> Result<(), Error> {
        self.check_unloaded()?;
        let formula = DimacsParser::parse(input)?;

        info!(
            "parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );

        self.load(formula.var_count(), &formula)?;
        Ok(())
    }

    /// Probe variables in the given order instead of ascending order.
    pub fn set_probe_order(&mut self, order: Vec<Var>) -> Result<(), PreprocessError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        if !ctx.part(PreprocessStateP).loaded {
            return Err(PreprocessError::NotLoaded);
        }

        let var_count = ctx.part(ClauseStoreP).var_count();
        let mut seen = vec![false; var_count];
        let is_permutation = order.len() == var_count
            && order.iter().all(|var| {
                var.index() < var_count && !std::mem::replace(&mut seen[var.index()], true)
            });

        if !is_permutation {
            return Err(PreprocessError::InvalidProbeOrder { var_count });
        }

        ctx.part_mut(ScheduleP).set_order(order);
        Ok(())
    }

    /// Probe for failed literals until a fixpoint is reached.
    ///
    /// Calling this again returns the same outcome without further work.
    pub fn preprocess(&mut self) -> Result<Outcome, PreprocessError> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        let state = ctx.part(PreprocessStateP);
        if !state.loaded {
            return Err(PreprocessError::NotLoaded);
        }

        if !state.finished {
            let result = propagate_units(ctx.borrow()).and_then(|()| probe_rounds(ctx.borrow()));

            let state = ctx.part_mut(PreprocessStateP);
            if let Err(unsat) = result {
                info!("inconsistent: {}", unsat);
                state.unsat = Some(unsat);
            }
            state.finished = true;
        }

        Ok(extract(ctx.borrow()))
    }

    /// Statistics collected so far.
    pub fn stats(&self) -> Stats {
        let mut ctx = self.ctx.into_partial_ref();
        *ctx.part(StatsP)
    }

    fn check_unloaded(&mut self) -> Result<(), PreprocessError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        if ctx.part(PreprocessStateP).loaded {
            Err(PreprocessError::AlreadyLoaded)
        } else {
            Ok(())
        }
    }

    fn install(&mut self, store: ClauseStore) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        load_formula(ctx.borrow(), store);
    }
}

/// Preprocess a single formula.
pub fn preprocess(
    var_count: usize,
    formula: &CnfFormula,
    config: &PreprocessorConfig,
) -> Result<Outcome, PreprocessError> {
    let mut preprocessor = Preprocessor::with_config(config)?;
    preprocessor.load(var_count, formula)?;
    preprocessor.preprocess()
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{prelude::*, *};

    use rand::{seq::SliceRandom, SeedableRng};
    use rand::rngs::StdRng;

    use flprep_formula::{
        cnf::strategy::cnf_formula,
        cnf_formula, lits,
        test::{failing_chain, models, sat_formula},
        Lit,
    };

    use crate::dimacs::write_dimacs;
    use crate::state::Unsat;

    fn run(formula: &CnfFormula) -> (Outcome, Stats) {
        let mut preprocessor = Preprocessor::new();
        preprocessor.load(formula.var_count(), formula).unwrap();
        let outcome = preprocessor.preprocess().unwrap();
        (outcome, preprocessor.stats())
    }

    fn run_with_order(formula: &CnfFormula, order: Vec<Var>) -> Outcome {
        let mut preprocessor = Preprocessor::new();
        preprocessor.load(formula.var_count(), formula).unwrap();
        preprocessor.set_probe_order(order).unwrap();
        preprocessor.preprocess().unwrap()
    }

    #[test]
    fn unit_contradicts_implication() {
        let formula = cnf_formula![
            1;
            -1, 2;
            -2;
        ];
        let (outcome, _) = run(&formula);

        assert!(outcome.is_inconsistent());
        assert_eq!(outcome.unsat, Some(Unsat::InitialPropagation { clause: 1 }));

        let mut output = vec![];
        outcome.write_dimacs(&mut output).unwrap();
        assert_eq!(&output[..], &b"p cnf 1 2\n-1 0\n1 0\n"[..]);
    }

    #[test]
    fn failed_literal_and_its_implication() {
        let formula = cnf_formula![
            1, 2;
            -1, 2;
            1, -2;
        ];
        let (outcome, stats) = run(&formula);

        assert!(!outcome.is_inconsistent());
        assert_eq!(outcome.forced, lits![1, 2].to_vec());
        assert!(outcome.simplified.is_empty());
        assert_eq!(outcome.simplified.var_count(), 2);
        assert_eq!(stats.failed_literals, 1);

        let mut output = vec![];
        outcome.write_dimacs(&mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "p cnf 2 2\n1 0\n2 0\n"
        );
    }

    #[test]
    fn no_consequences() {
        let formula = cnf_formula![
            1, 2;
            -1, -2;
        ];
        let (outcome, stats) = run(&formula);

        assert!(!outcome.is_inconsistent());
        assert!(outcome.forced.is_empty());
        assert_eq!(outcome.simplified, formula);
        assert_eq!(outcome.to_formula(), formula);
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.units, 0);
    }

    #[test]
    fn single_unit() {
        let formula = cnf_formula![
            1;
        ];
        let (outcome, stats) = run(&formula);

        assert_eq!(outcome.forced, lits![1].to_vec());
        assert!(outcome.simplified.is_empty());
        assert_eq!(stats.units, 1);
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.decisions, 0);
    }

    #[test]
    fn no_variables() {
        let (outcome, stats) = run(&CnfFormula::new());

        assert!(!outcome.is_inconsistent());
        assert!(outcome.forced.is_empty());
        assert_eq!(stats.rounds, 1);

        let mut output = vec![];
        outcome.write_dimacs(&mut output).unwrap();
        assert_eq!(&output[..], &b"p cnf 0 0\n"[..]);
    }

    #[test]
    fn empty_clause_is_inconsistent() {
        let mut preprocessor = Preprocessor::new();
        preprocessor
            .load_dimacs_ints(3, &[vec![1, 2], vec![], vec![3]])
            .unwrap();
        let outcome = preprocessor.preprocess().unwrap();

        assert_eq!(outcome.unsat, Some(Unsat::EmptyClause { clause: 1 }));
        assert_eq!(preprocessor.stats().rounds, 0);
    }

    #[test]
    fn unused_variables_stay_declared() {
        let mut formula = cnf_formula![
            -1, 2;
            -1, -2;
        ];
        formula.set_var_count(4);

        let (outcome, _) = run(&formula);

        assert_eq!(outcome.forced, lits![-1].to_vec());
        assert_eq!(outcome.to_formula().var_count(), 4);
    }

    #[test]
    fn api_misuse() {
        let mut preprocessor = Preprocessor::new();
        assert!(matches!(
            preprocessor.preprocess(),
            Err(PreprocessError::NotLoaded)
        ));
        assert!(matches!(
            preprocessor.set_probe_order(vec![]),
            Err(PreprocessError::NotLoaded)
        ));

        preprocessor.load(2, &cnf_formula![1, -2;]).unwrap();

        assert!(matches!(
            preprocessor.load(2, &cnf_formula![1;]),
            Err(PreprocessError::AlreadyLoaded)
        ));
        assert!(matches!(
            preprocessor.set_probe_order(vec![Var::from_index(0), Var::from_index(0)]),
            Err(PreprocessError::InvalidProbeOrder { var_count: 2 })
        ));
        assert!(matches!(
            preprocessor.set_probe_order(vec![Var::from_index(1)]),
            Err(PreprocessError::InvalidProbeOrder { var_count: 2 })
        ));

        let first = preprocessor.preprocess().unwrap();
        let decisions = preprocessor.stats().decisions;
        assert_eq!(preprocessor.preprocess().unwrap(), first);
        assert_eq!(preprocessor.stats().decisions, decisions);
    }

    #[test]
    fn rejects_bad_input() {
        let mut preprocessor = Preprocessor::new();
        assert!(matches!(
            preprocessor.load(1, &cnf_formula![1, 2;]),
            Err(PreprocessError::MalformedFormula(
                FormulaError::LiteralOutOfRange { clause: 0, lit: 2, var_count: 1 }
            ))
        ));

        assert!(matches!(
            Preprocessor::with_config(&PreprocessorConfig {
                threads: 0,
                fanout_grain: 1,
            }),
            Err(PreprocessError::InvalidConfig(ConfigError::ZeroThreads))
        ));

        let mut preprocessor = Preprocessor::new();
        assert!(preprocessor.load_dimacs(&b"1 2 0\n"[..]).is_err());
    }

    #[test]
    fn config_update_keeps_old_values_on_error() {
        let mut preprocessor = Preprocessor::new();

        let mut update = PreprocessorConfigUpdate::new();
        update.threads = Some(0);
        assert!(preprocessor.config(&update).is_err());

        update.threads = Some(2);
        update.fanout_grain = Some(4);
        preprocessor.config(&update).unwrap();

        preprocessor.load(3, &cnf_formula![1, 2; -1, 3; -1, -3;]).unwrap();
        let outcome = preprocessor.preprocess().unwrap();
        assert_eq!(outcome.forced, lits![-1, 2].to_vec());
    }

    proptest! {
        #[test]
        fn models_are_preserved(formula in cnf_formula(1..9usize, 0..30, 1..4)) {
            let (outcome, _) = run(&formula);

            let input_models = models(&formula);

            if outcome.is_inconsistent() {
                prop_assert!(input_models.is_empty());
            } else {
                let output = outcome.to_formula();
                prop_assert_eq!(output.var_count(), formula.var_count());
                prop_assert_eq!(models(&output), input_models.clone());

                // Forced literals hold in every model.
                for model in input_models.iter() {
                    for lit in outcome.forced.iter() {
                        prop_assert_eq!(model[lit.index()], lit.is_positive());
                    }
                }
            }
        }

        #[test]
        fn satisfiable_stays_consistent(
            formula in sat_formula(4..30usize, 10..80usize, 0.05..0.2, 0.5..1.0),
        ) {
            let (outcome, _) = run(&formula);
            prop_assert!(!outcome.is_inconsistent());
        }

        #[test]
        fn chain_head_fails(formula in failing_chain(2..40usize, 0..20usize)) {
            let (outcome, stats) = run(&formula);
            // The first probed variable is the head of the chain.
            prop_assert!(stats.failed_literals >= 1);
            prop_assert!(outcome.is_inconsistent() || !outcome.forced.is_empty());
        }

        #[test]
        fn fixpoint_is_idempotent(formula in cnf_formula(1..30usize, 0..80, 1..5)) {
            let (outcome, _) = run(&formula);
            prop_assume!(!outcome.is_inconsistent());

            let (again, stats) = run(&outcome.to_formula());

            prop_assert!(!again.is_inconsistent());
            prop_assert_eq!(stats.failed_literals, 0);
            prop_assert_eq!(stats.rounds, 1);
            prop_assert_eq!(again.forced, outcome.forced);
            prop_assert_eq!(again.simplified, outcome.simplified);
        }

        #[test]
        fn order_does_not_change_fixpoint(
            formula in cnf_formula(1..25usize, 0..70, 1..5),
            seed in any::<u64>(),
        ) {
            let (expected, _) = run(&formula);

            let mut order: Vec<Var> = Var::all(formula.var_count()).collect();
            order.shuffle(&mut StdRng::seed_from_u64(seed));

            let outcome = run_with_order(&formula, order);

            prop_assert_eq!(outcome.is_inconsistent(), expected.is_inconsistent());
            if !expected.is_inconsistent() {
                prop_assert_eq!(outcome.forced, expected.forced);
                prop_assert_eq!(outcome.simplified, expected.simplified);
            }
        }

        #[test]
        fn threads_do_not_change_result(
            formula in cnf_formula(1..40usize, 0..200, 1..6),
            grain in 1..8usize,
        ) {
            let (expected, expected_stats) = run(&formula);

            let config = PreprocessorConfig {
                threads: 3,
                fanout_grain: grain,
            };
            let outcome = preprocess(formula.var_count(), &formula, &config).unwrap();

            prop_assert_eq!(outcome, expected);

            let mut preprocessor = Preprocessor::with_config(&config).unwrap();
            preprocessor.load(formula.var_count(), &formula).unwrap();
            preprocessor.preprocess().unwrap();
            prop_assert_eq!(preprocessor.stats(), expected_stats);
        }

        #[test]
        fn dimacs_input(formula in cnf_formula(1..20usize, 0..50, 1..4)) {
            let mut dimacs = vec![];
            write_dimacs(&mut dimacs, &formula).unwrap();

            let mut preprocessor = Preprocessor::new();
            preprocessor.load_dimacs(&dimacs[..]).unwrap();
            let outcome = preprocessor.preprocess().unwrap();

            let (expected, _) = run(&formula);
            prop_assert_eq!(outcome, expected);
        }

        #[test]
        fn forced_literals_are_assigned_once(formula in cnf_formula(1..30usize, 0..80, 1..5)) {
            let (outcome, stats) = run(&formula);
            prop_assume!(!outcome.is_inconsistent());

            let vars: Vec<usize> = outcome.forced.iter().map(|lit: &Lit| lit.index()).collect();
            prop_assert!(vars.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert_eq!(vars.len() as u64, stats.units);
        }
    }
}
