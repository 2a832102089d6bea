//! Decision heuristics.

use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::prop::{enqueue_assignment, Reason};

pub mod order;
pub mod vsids;

/// Make a decision and enqueue it.
///
/// Literals of the selection order are preferred. Otherwise the unassigned variable of highest
/// activity is assigned its saved phase.
///
/// Returns `false` if no decision was made because all eligible variables are assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut SelectionOrderP,
        mut TrailP,
        mut VsidsP
    ),
) -> bool {
    let (order, mut ctx) = ctx.split_part_mut(SelectionOrderP);
    let (vsids, mut ctx) = ctx.split_part_mut(VsidsP);

    let assignment = ctx.part(AssignmentP);

    let decision = order
        .next_unassigned(|lit| assignment.lit_is_unk(lit))
        .or_else(|| {
            vsids
                .find(|&var| assignment.var_value(var).is_none())
                .map(|var| var.lit(assignment.last_var_value(var)))
        });

    if let Some(decision) = decision {
        ctx.part_mut(TrailP).new_decision_level();

        enqueue_assignment(ctx.borrow(), decision, Reason::Unit);

        true
    } else {
        false
    }
}
