//! Unit propagation.
use partial_ref::{partial, PartialRef};

use crate::clause::ClauseIdx;
use crate::context::{
    AssignmentP, ClauseStoreP, Context, NonFalseP, OccurrencesP, StatsP, TrailP, WorkersP,
};
use crate::lit::Lit;

pub mod assignment;
pub mod counters;
pub mod sweep;

pub use assignment::{backtrack, decide, enqueue_assignment, Assignment, Trail};
pub use counters::NonFalse;
pub use sweep::Workers;

/// A clause with all literals false.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Conflict {
    pub clause: ClauseIdx,
}

/// Propagate all queued assignments.
///
/// Stops at the first conflict. Assignments made before that stay on the trail.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut NonFalseP,
        mut StatsP,
        mut TrailP,
        ClauseStoreP,
        OccurrencesP,
        WorkersP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part(TrailP).queue_head() {
        ctx.part_mut(TrailP).pop_queue();
        ctx.part_mut(StatsP).propagations += 1;
        propagate_lit(ctx.borrow(), lit)?;
    }
    Ok(())
}

/// What a near-unit clause implies under the current assignment.
enum NearUnit {
    Satisfied,
    Forced(Lit),
    Falsified,
}

fn near_unit_state(
    ctx: partial!(Context, AssignmentP, ClauseStoreP),
    clause: ClauseIdx,
) -> NearUnit {
    let assignment = ctx.part(AssignmentP);
    let first_non_false = ctx
        .part(ClauseStoreP)
        .clause(clause)
        .iter()
        .cloned()
        .find(|&lit| !assignment.lit_is_false(lit));

    match first_non_false {
        Some(lit) if assignment.lit_is_true(lit) => NearUnit::Satisfied,
        Some(lit) => NearUnit::Forced(lit),
        None => NearUnit::Falsified,
    }
}

/// Falsify `!lit` in all clauses and assign the implied literals.
fn propagate_lit(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut NonFalseP,
        mut StatsP,
        mut TrailP,
        ClauseStoreP,
        OccurrencesP,
        WorkersP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let result = {
        let (non_false, ctx) = ctx.split_part_mut(NonFalseP);
        let clauses = ctx.part(OccurrencesP).clauses_of(!lit);
        sweep::sweep(ctx.part(WorkersP), non_false.counts_mut(), clauses)
    };

    if let Some(clause) = result.falsified {
        return Err(Conflict { clause });
    }

    for &clause in result.near_unit.iter() {
        match near_unit_state(ctx.borrow(), clause) {
            NearUnit::Satisfied => (),
            NearUnit::Forced(forced) => enqueue_assignment(ctx.borrow(), forced),
            NearUnit::Falsified => return Err(Conflict { clause }),
        }
    }

    Ok(())
}
