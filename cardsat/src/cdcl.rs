//! Conflict driven clause learning.

use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::clause::{
    bump_clause, bump_clause_activity, decay_clause_activities, learned_clause_header, ClauseDb,
};
use crate::context::{parts::*, Context};
use crate::proof::ProofStep;
use crate::prop::{backtrack, enqueue_assignment, Conflict, Reason};

/// Learn a clause from a conflict, backtrack and assert the learned clause.
///
/// Must not be called at decision level 0.
pub fn learn_from_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut ProofP,
        mut ScheduleP,
        mut SelectionOrderP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        IncrementalP,
        SolverConfigP,
    ),
    conflict: Conflict,
) {
    debug_assert!(ctx.part(TrailP).current_level() > 0);

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    let glue = analyze.glue();
    ctx.part_mut(ScheduleP).record_glue(glue);

    // Glue levels of involved clauses are computed on the conflicting assignment.
    for &cref in analyze.involved() {
        bump_clause(ctx.borrow(), cref);
    }

    backtrack(ctx.borrow(), backtrack_to);

    let order = ctx.part_mut(SelectionOrderP);
    if backtrack_to < order.len() {
        order.rewind(backtrack_to);
    }

    let clause = analyze.clause();

    ctx.part_mut(ProofP).add_step(ProofStep::AddClause {
        clause: clause.to_vec(),
    });

    if clause.len() == 1 {
        enqueue_assignment(ctx.borrow(), clause[0], Reason::Unit);
        ctx.part_mut(ClauseDbP).add_unit(clause[0]);
    } else {
        let header = learned_clause_header(ctx.borrow(), glue);
        let cref = ClauseDb::add_clause(ctx.borrow(), header, clause);
        ClauseDb::attach_clause(ctx.borrow(), cref);
        bump_clause_activity(ctx.borrow(), cref);

        let reason = if clause.len() == 2 {
            Reason::Binary([clause[1]])
        } else {
            Reason::Long(cref)
        };
        enqueue_assignment(ctx.borrow(), clause[0], reason);
    }

    ctx.part_mut(VsidsP).decay();
    decay_clause_activities(ctx.borrow());
}
