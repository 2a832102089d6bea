//! Propagation of long clauses.
use std::mem::replace;

use partial_ref::{partial, PartialRef};
use vec_mut_scan::VecMutScan;

use cardsat_formula::Lit;

use crate::context::{parts::*, Context};

use super::enqueue_assignment;
use super::{Conflict, Reason, Watch};

/// Propagate all literals implied by long clauses watched by the given literal.
///
/// On conflict return the clause propgating the conflicting assignment. The remaining watches of
/// the literal are kept.
///
/// See [`prop::watch`](crate::prop::watch) for the invariants that this has to uphold.
#[inline(never)]
pub fn propagate_long(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseAllocP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    // The watches are moved out of the watchlist, so new watches can be added to other lists while
    // scanning.
    let mut watches = replace(ctx.part_mut(WatchlistsP).watched_by_mut(lit), vec![]);

    let mut scan = VecMutScan::new(&mut watches);

    let mut result = Ok(());

    'watches: while let Some(watch) = scan.next() {
        // A true blocking literal satisfies the clause without looking at it.
        if ctx.part(AssignmentP).lit_is_true(watch.blocking) {
            continue;
        }

        let cref = watch.cref;

        let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);
        let lits = alloc.clause_mut(cref).lits_mut();

        // The false literal goes to position 1, so a propagated literal ends up at position 0.
        let mut first = lits[0];
        if first == !lit {
            lits.swap(0, 1);
            first = lits[0];
        }

        // Either replaces the processed watch or moves to the list of another literal.
        let new_watch = Watch {
            cref,
            blocking: first,
        };

        if first != watch.blocking && ctx.part(AssignmentP).lit_is_true(first) {
            watch.replace(new_watch);
            continue;
        }

        let (initial, rest) = lits.split_at_mut(2);

        for rest_lit_ref in rest.iter_mut() {
            let rest_lit = *rest_lit_ref;
            if !ctx.part(AssignmentP).lit_is_false(rest_lit) {
                initial[1] = rest_lit;
                *rest_lit_ref = !lit;
                ctx.part_mut(WatchlistsP).add_watch(!rest_lit, new_watch);
                watch.remove();
                continue 'watches;
            }
        }

        // No replacement, the clause is unit or conflicting.
        watch.replace(new_watch);

        if ctx.part(AssignmentP).lit_is_false(first) {
            result = Err(Conflict::Long(cref));
            break;
        }

        enqueue_assignment(ctx.borrow(), first, Reason::Long(cref));
    }

    // Unprocessed watches stay in place.
    drop(scan);

    *ctx.part_mut(WatchlistsP).watched_by_mut(lit) = watches;

    result
}
