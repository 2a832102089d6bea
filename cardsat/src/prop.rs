//! Unit propagation.
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};

pub mod assignment;
pub mod at_most;
pub mod binary;
pub mod graph;
pub mod long;
pub mod watch;

pub use assignment::{
    backtrack, complete_backtrack, enqueue_assignment, full_restart, Assignment, Trail,
};
pub use binary::BinaryClauses;
pub use graph::{Conflict, ImplGraph, Reason};
pub use watch::{Watch, Watchlists};

/// Propagate enqueued assignments.
///
/// Returns when all enqueued assignments are propagated, including newly propagated assignemnts,
/// or if there is a conflict.
///
/// On conflict the first propagation that would assign the opposite value to an already assigned
/// literal is returned and the remaining enqueued assignments are skipped.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part(TrailP).queue_head() {
        ctx.part_mut(TrailP).pop_queue();

        let result = binary::propagate_binary(ctx.borrow(), lit)
            .and_then(|()| long::propagate_long(ctx.borrow(), lit))
            .and_then(|()| at_most::propagate_at_most(ctx.borrow(), lit));

        if let Err(conflict) = result {
            ctx.part_mut(TrailP).fast_forward_queue();
            return Err(conflict);
        }
    }

    Ok(())
}
