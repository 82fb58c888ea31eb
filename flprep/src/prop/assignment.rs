use partial_ref::{partial, PartialRef};

use log::trace;

use crate::context::{AssignmentP, Context, NonFalseP, OccurrencesP, StatsP, TrailP};
use crate::lit::{Lit, Var};

/// Current partial assignment.
#[derive(Default)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
    }

    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = Some(lit.is_positive())
    }

    fn unassign(&mut self, var: Var) {
        self.assignment[var.index()] = None
    }
}

/// Assigned literals in assignment order.
///
/// The part behind `queue_head_pos` doubles as the propagation queue, so propagation is a
/// breadth-first traversal of the implied literals.
#[derive(Default)]
pub struct Trail {
    /// All assigned literals, propagated or not.
    trail: Vec<Lit>,
    /// Next literal in the trail to propagate.
    queue_head_pos: usize,
    /// Trail length when the outstanding decision was made.
    decision: Option<usize>,
}

impl Trail {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.trail.reserve(count.saturating_sub(self.trail.len()));
    }

    /// The next assigned literal to propagate.
    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).cloned()
    }

    pub fn pop_queue(&mut self) {
        self.queue_head_pos += 1;
        debug_assert!(self.queue_head_pos <= self.trail.len());
    }

    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn fully_propagated(&self) -> bool {
        self.queue_head_pos == self.trail.len()
    }

    /// Whether a decision is outstanding, i.e. assignments are tentative.
    pub fn deciding(&self) -> bool {
        self.decision.is_some()
    }
}

/// Assigns true to an unassigned literal and queues it for propagation.
///
/// Without an outstanding decision the assignment is permanent and counted as a unit.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut StatsP, mut TrailP),
    lit: Lit,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let trail = ctx.part_mut(TrailP);
    trail.trail.push(lit);
    let permanent = !trail.deciding();

    if permanent {
        ctx.part_mut(StatsP).units += 1;
    }

    trace!("assign {}{}", lit, if permanent { " (unit)" } else { "" });
}

/// Tentatively assigns true to `lit`, opening a scope that [`backtrack`] undoes.
///
/// Requires a fully propagated trail without an outstanding decision.
pub fn decide(mut ctx: partial!(Context, mut AssignmentP, mut StatsP, mut TrailP), lit: Lit) {
    let trail = ctx.part_mut(TrailP);
    debug_assert!(!trail.deciding());
    debug_assert!(trail.fully_propagated());

    trail.decision = Some(trail.trail.len());
    ctx.part_mut(StatsP).decisions += 1;

    trace!("decide {}", lit);

    enqueue_assignment(ctx.borrow(), lit);
}

/// Undo the outstanding decision and everything assigned after it.
///
/// Every counter decremented while propagating one of the undone literals is incremented again,
/// so the counters end up exactly as they were before the decision. Does nothing without an
/// outstanding decision.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut NonFalseP, mut TrailP, OccurrencesP),
) {
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    let decision = match trail.decision.take() {
        Some(decision) => decision,
        None => return,
    };

    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (non_false, ctx) = ctx.split_part_mut(NonFalseP);
    let occurrences = ctx.part(OccurrencesP);

    for pos in (decision..trail.trail.len()).rev() {
        let lit = trail.trail[pos];
        assignment.unassign(lit.var());
        // Literals still queued never touched any counter.
        if pos < trail.queue_head_pos {
            non_false.restore(occurrences.clauses_of(!lit));
        }
    }

    trail.trail.truncate(decision);
    trail.queue_head_pos = decision;
}
