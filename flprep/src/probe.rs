//! Failed literal probing.
use partial_ref::{partial, PartialRef};

use log::{debug, info};

use crate::context::{
    AssignmentP, ClauseStoreP, Context, NonFalseP, OccurrencesP, ScheduleP, StatsP, TrailP,
    WorkersP,
};
use crate::lit::{Lit, Var};
use crate::prop::{backtrack, decide, enqueue_assignment, propagate, Conflict};
use crate::state::Unsat;

/// Order in which variables are probed within a round.
#[derive(Default)]
pub struct ProbeSchedule {
    order: Vec<Var>,
}

impl ProbeSchedule {
    /// Reset to ascending variable order.
    pub fn set_var_count(&mut self, count: usize) {
        self.order.clear();
        self.order.extend(Var::all(count));
    }

    /// Replace the order, which must be a permutation of all variables.
    pub fn set_order(&mut self, order: Vec<Var>) {
        debug_assert_eq!(order.len(), self.order.len());
        self.order = order;
    }

    pub fn order(&self) -> &[Var] {
        &self.order
    }
}

/// Assign all unit clauses and propagate them.
pub fn propagate_units(
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
) -> Result<(), Unsat> {
    for index in 0..ctx.part(ClauseStoreP).len() {
        let lit = match ctx.part(ClauseStoreP).clause(index as _) {
            [] => {
                debug!("found empty clause {}", index);
                return Err(Unsat::EmptyClause { clause: index });
            }
            &[lit] => lit,
            _ => continue,
        };

        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => (),
            Some(false) => {
                debug!("found contradictory unit clause {}", index);
                return Err(Unsat::ContradictoryUnits {
                    clause: index as _,
                });
            }
            None => {
                debug!("implying {} by unit clause {}", lit, index);
                enqueue_assignment(ctx.borrow(), lit);
            }
        }
    }

    propagate(ctx.borrow()).map_err(|Conflict { clause }| {
        info!("initial top level propagation failed");
        Unsat::InitialPropagation { clause }
    })
}

/// Whether assigning `lit` leads to a conflict.
///
/// Undoes all assignments made while checking.
fn probe_lit(
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
) -> bool {
    decide(ctx.borrow(), lit);
    let failed = propagate(ctx.borrow()).is_err();
    backtrack(ctx.borrow());
    failed
}

/// Probe both polarities of every unassigned variable until a round finds no failed literal.
///
/// The negation of a failed literal is assigned and propagated right away, so later variables of
/// the same round already see it.
pub fn probe_rounds(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut NonFalseP,
        mut StatsP,
        mut TrailP,
        ClauseStoreP,
        OccurrencesP,
        ScheduleP,
        WorkersP,
    ),
) -> Result<(), Unsat> {
    loop {
        let mut changed = false;
        let round = ctx.part(StatsP).rounds + 1;

        for index in 0..ctx.part(ScheduleP).order().len() {
            let var = ctx.part(ScheduleP).order()[index];

            if ctx.part(AssignmentP).var_value(var).is_some() {
                continue;
            }

            let failed = if probe_lit(ctx.borrow(), var.positive()) {
                var.positive()
            } else if probe_lit(ctx.borrow(), var.negative()) {
                var.negative()
            } else {
                continue;
            };

            changed = true;
            ctx.part_mut(StatsP).failed_literals += 1;
            debug!("failed literal {}", failed);

            enqueue_assignment(ctx.borrow(), !failed);
            if let Err(Conflict { clause }) = propagate(ctx.borrow()) {
                info!("top level propagation in round {} failed", round);
                return Err(Unsat::FailedLiteralPropagation {
                    round,
                    lit: failed,
                    clause,
                });
            }
        }

        let stats = ctx.part_mut(StatsP);
        stats.rounds += 1;
        info!("{} units after round {}", stats.units, stats.rounds);

        if !changed {
            return Ok(());
        }
    }
}
