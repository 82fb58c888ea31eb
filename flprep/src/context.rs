//! Central preprocessor data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::clause::ClauseStore;
use crate::config::PreprocessorConfig;
use crate::occurrences::Occurrences;
use crate::probe::ProbeSchedule;
use crate::prop::{Assignment, NonFalse, Trail, Workers};
use crate::state::PreprocessState;
use crate::stats::Stats;

/// Part declarations for the [`Context`] struct.
mod parts {
    use super::*;

    part!(pub AssignmentP: Assignment);
    part!(pub ClauseStoreP: ClauseStore);
    part!(pub ConfigP: PreprocessorConfig);
    part!(pub NonFalseP: NonFalse);
    part!(pub OccurrencesP: Occurrences);
    part!(pub PreprocessStateP: PreprocessState);
    part!(pub ScheduleP: ProbeSchedule);
    part!(pub StatsP: Stats);
    part!(pub TrailP: Trail);
    part!(pub WorkersP: Workers);
}

pub use parts::*;

/// Central preprocessor data structure.
///
/// Holds the loaded formula, its occurrence index, the current assignment and everything needed
/// to propagate and undo decisions. Functions working on several fields take partial references
/// (see the `partial_ref` crate), which spells out what each function reads and writes.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part = "AssignmentP"]
    assignment: Assignment,
    #[part = "ClauseStoreP"]
    clause_store: ClauseStore,
    #[part = "ConfigP"]
    config: PreprocessorConfig,
    #[part = "NonFalseP"]
    non_false: NonFalse,
    #[part = "OccurrencesP"]
    occurrences: Occurrences,
    #[part = "PreprocessStateP"]
    preprocess_state: PreprocessState,
    #[part = "ScheduleP"]
    schedule: ProbeSchedule,
    #[part = "StatsP"]
    stats: Stats,
    #[part = "TrailP"]
    trail: Trail,
    #[part = "WorkersP"]
    workers: Workers,
}

/// Install a formula and size all per-variable and per-clause structures for it.
pub fn load_formula(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseStoreP,
        mut NonFalseP,
        mut OccurrencesP,
        mut PreprocessStateP,
        mut ScheduleP,
        mut TrailP,
    ),
    store: ClauseStore,
) {
    let var_count = store.var_count();

    *ctx.part_mut(OccurrencesP) = Occurrences::build(&store);
    ctx.part_mut(NonFalseP).reset(&store);
    *ctx.part_mut(ClauseStoreP) = store;

    ctx.part_mut(AssignmentP).set_var_count(var_count);
    ctx.part_mut(TrailP).set_var_count(var_count);
    ctx.part_mut(ScheduleP).set_var_count(var_count);

    ctx.part_mut(PreprocessStateP).loaded = true;
}
