//! Clause assessment.
use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::context::{parts::*, Context};
use crate::glue::compute_glue;

use super::{bump_clause_activity, ClauseHeader, ClauseRef};

/// Generate the header for a newly learned clause.
///
/// `glue` is computed during conflict analysis, while the clause is still conflicting.
pub fn learned_clause_header(ctx: partial!(Context, IncrementalP), glue: usize) -> ClauseHeader {
    let mut header = ClauseHeader::new();
    header.set_glue(glue);
    header.set_learnt_on_state(ctx.part(IncrementalP).next_state_id());
    header
}

/// Update stats of a learned clause involved in a conflict.
///
/// Bumps the clause's activity and updates its glue level when it improved by more than one. A
/// clause improving that way is protected from the next database reduction, unless its glue level
/// was very high.
pub fn bump_clause(
    mut ctx: partial!(
        Context,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut TmpDataP,
        ClauseDbP,
        ImplGraphP,
        SolverConfigP,
    ),
    cref: ClauseRef,
) {
    bump_clause_activity(ctx.borrow(), cref);

    let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);
    let clause = alloc.clause_mut(cref);

    let old_glue = clause.header().glue();
    if old_glue <= 2 {
        return;
    }

    let glue = compute_glue(ctx.borrow(), clause.lits());

    if glue + 1 < old_glue {
        if old_glue <= ctx.part(SolverConfigP).lb_lbd_frozen_clause {
            clause.header_mut().set_can_be_deleted(false);
        }
        clause.header_mut().set_glue(glue);
    }
}

/// Sort key used to rank learned clauses for deletion, lowest first.
pub fn deletion_rank(header: &ClauseHeader, lits: &[Lit]) -> impl Ord {
    (
        lits.len() <= 2,
        std::cmp::Reverse(header.glue()),
        ordered_float::OrderedFloat(header.activity()),
    )
}
