//! Propagation of at-most-k constraints.
use std::mem::replace;

use partial_ref::{partial, PartialRef};
use vec_mut_scan::VecMutScan;

use cardsat_formula::Lit;

use crate::clause::{ClauseAlloc, ClauseRef};
use crate::context::{parts::*, Context};

use super::enqueue_assignment;
use super::{Assignment, Conflict, Reason};

/// Outcome of scanning the watched literals of a triggered at-most-k constraint.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum WatchUpdate {
    /// The constraint can neither propagate nor be violated.
    Keep,
    /// The watch moved from the true literal to the given unwatched literal.
    Moved(Lit),
    /// All watched literals except the true one have to become false.
    Propagate,
    Conflict,
}

/// Scan the watched literals of a constraint after `lit` became true.
fn update_watch(
    alloc: &mut ClauseAlloc,
    assignment: &Assignment,
    cref: ClauseRef,
    lit: Lit,
) -> WatchUpdate {
    let clause = alloc.clause_mut(cref);
    let watchers = clause.header().at_most_watchers();
    let lits = clause.lits_mut();
    let max_true = lits.len() - watchers + 1;

    let mut false_count = 0;
    let mut true_count = 0;

    for pos in 0..watchers {
        let watched = lits[pos];
        match assignment.lit_value(watched) {
            None => (),
            Some(false) => {
                false_count += 1;
                if false_count + 1 >= watchers {
                    return WatchUpdate::Keep;
                }
            }
            Some(true) => {
                true_count += 1;
                if true_count > max_true {
                    return WatchUpdate::Conflict;
                }
                if watched == lit {
                    let (watched_lits, unwatched) = lits.split_at_mut(watchers);
                    if let Some(replacement) = unwatched
                        .iter_mut()
                        .find(|candidate| !assignment.lit_is_true(**candidate))
                    {
                        let new_watch = *replacement;
                        *replacement = lit;
                        watched_lits[pos] = new_watch;
                        return WatchUpdate::Moved(new_watch);
                    }
                }
            }
        }
    }

    if true_count > 1 {
        WatchUpdate::Conflict
    } else {
        WatchUpdate::Propagate
    }
}

/// Propagate all at-most-k constraints watching the given literal, which just became true.
///
/// On conflict return the violated constraint. The remaining watches of the literal are kept.
#[inline(never)]
pub fn propagate_at_most(
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
    let mut watches = replace(ctx.part_mut(WatchlistsP).at_most_by_mut(lit), vec![]);

    let mut scan = VecMutScan::new(&mut watches);

    let mut result = Ok(());

    while let Some(watch) = scan.next() {
        let cref = *watch;

        let (alloc, mut ctx) = ctx.split_part_mut(ClauseAllocP);

        match update_watch(alloc, ctx.part(AssignmentP), cref, lit) {
            WatchUpdate::Keep => (),
            WatchUpdate::Moved(new_watch) => {
                watch.remove();
                ctx.part_mut(WatchlistsP)
                    .at_most_by_mut(new_watch)
                    .push(cref);
            }
            WatchUpdate::Conflict => {
                result = Err(Conflict::AtMost(cref));
                break;
            }
            WatchUpdate::Propagate => {
                let clause = alloc.clause(cref);
                let watchers = clause.header().at_most_watchers();
                for &watched in &clause.lits()[..watchers] {
                    if watched != lit && !ctx.part(AssignmentP).lit_is_false(watched) {
                        debug_assert!(ctx.part(AssignmentP).lit_is_unk(watched));
                        enqueue_assignment(ctx.borrow(), !watched, Reason::AtMost(cref));
                    }
                }
            }
        }
    }

    drop(scan);

    *ctx.part_mut(WatchlistsP).at_most_by_mut(lit) = watches;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits};

    use crate::clause::{ClauseDb, ClauseHeader};
    use crate::context::set_var_count;
    use crate::prop::propagate;

    fn add_at_most(
        mut ctx: partial!(
            Context,
            mut BinaryClausesP,
            mut ClauseAllocP,
            mut ClauseDbP,
            mut WatchlistsP,
        ),
        lits: &[Lit],
        k: usize,
    ) -> ClauseRef {
        let mut header = ClauseHeader::new();
        header.set_at_most_watchers(lits.len() - k + 1);
        let cref = ClauseDb::add_clause(ctx.borrow(), header, lits);
        ClauseDb::attach_clause(ctx.borrow(), cref);
        cref
    }

    #[test]
    fn propagates_after_k_true() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 5);

        let cref = add_at_most(ctx.borrow(), &lits![1, 2, 3, 4, 5], 2);

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Unit);
        assert_eq!(propagate(ctx.borrow()), Ok(()));
        assert_eq!(ctx.part(TrailP).trail().len(), 1);

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(4), Reason::Unit);
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        let assignment = ctx.part(AssignmentP);
        for &lit in lits![2, 3, 5].iter() {
            assert!(assignment.lit_is_false(lit));
            let reason = *ctx.part(ImplGraphP).reason(lit.var());
            assert_eq!(reason, Reason::AtMost(cref));

            let mut antecedents: Vec<_> = reason
                .lits(ctx.part(ClauseAllocP), assignment)
                .collect();
            antecedents.sort();
            assert_eq!(antecedents, lits![-1, -4]);
        }
    }

    #[test]
    fn detects_violation() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 4);

        let cref = add_at_most(ctx.borrow(), &lits![1, 2, 3, 4], 1);

        enqueue_assignment(ctx.borrow(), lit!(3), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(2), Reason::Unit);

        let conflict = propagate(ctx.borrow());
        assert_eq!(conflict, Err(Conflict::AtMost(cref)));

        let mut antecedents: Vec<_> = Conflict::AtMost(cref)
            .lits(ctx.part(ClauseAllocP), ctx.part(AssignmentP))
            .collect();
        antecedents.sort();
        assert_eq!(antecedents, lits![-2, -3]);
    }
}
