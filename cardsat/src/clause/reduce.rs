//! Clause database reduction.
use std::mem::replace;

use log::debug;
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::proof::ProofStep;

use super::assess::deletion_rank;
use super::ClauseDb;

/// Delete about half of the learned clauses.
///
/// Learned clauses are ranked by glue level and then by activity. Binary clauses, clauses with a
/// glue level of at most 2, locked clauses and clauses protected since the last reduction are kept.
/// Each protected clause extends the deleted range by one.
///
/// Returns how often the next reduction should be delayed by the special increment. This is the
/// case when the kept clauses have small glue levels.
pub fn reduce_learnts(
    mut ctx: partial!(
        Context,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ProofP,
        mut WatchlistsP,
        AssignmentP,
        ImplGraphP,
    ),
) -> usize {
    let mut learnts = replace(ctx.part_mut(ClauseDbP).learnts_mut(), vec![]);

    if learnts.is_empty() {
        return 0;
    }

    {
        let alloc = ctx.part(ClauseAllocP);
        learnts.sort_by_cached_key(|&cref| {
            let clause = alloc.clause(cref);
            deletion_rank(clause.header(), clause.lits())
        });
    }

    let alloc = ctx.part(ClauseAllocP);
    let mut special_increments = 0;
    if alloc.header(learnts[learnts.len() / 2]).glue() <= 3 {
        special_increments += 1;
    }
    if alloc.header(learnts[learnts.len() - 1]).glue() <= 5 {
        special_increments += 1;
    }

    let mut limit = learnts.len() / 2;
    let mut deleted = 0;
    let mut index = 0;

    learnts.retain(|&cref| {
        let position = index;
        index += 1;

        let (can_be_deleted, deletable) = {
            let clause = ctx.part(ClauseAllocP).clause(cref);
            let header = clause.header();
            (
                header.can_be_deleted(),
                header.glue() > 2 && clause.lits().len() > 2,
            )
        };

        if deletable
            && can_be_deleted
            && position < limit
            && !ClauseDb::is_locked(ctx.borrow(), cref)
        {
            if ctx.part(ProofP).is_active() {
                let clause = ctx.part(ClauseAllocP).clause(cref).lits().to_vec();
                ctx.part_mut(ProofP)
                    .add_step(ProofStep::DeleteClause { clause });
            }
            ClauseDb::delete_clause(ctx.borrow(), cref);
            deleted += 1;
            false
        } else {
            if !can_be_deleted {
                limit += 1;
            }
            ctx.part_mut(ClauseAllocP)
                .header_mut(cref)
                .set_can_be_deleted(true);
            true
        }
    });

    debug!(
        "reduced learned clauses: deleted {}, kept {}",
        deleted,
        learnts.len()
    );

    *ctx.part_mut(ClauseDbP).learnts_mut() = learnts;

    special_increments
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, Lit, Var};

    use crate::clause::{ClauseHeader, ClauseRef};
    use crate::context::set_var_count;
    use crate::prop::{enqueue_assignment, Reason};

    fn add_learnt(
        mut ctx: partial!(
            Context,
            mut BinaryClausesP,
            mut ClauseAllocP,
            mut ClauseDbP,
            mut WatchlistsP,
        ),
        lits: &[Lit],
        glue: usize,
        activity: f32,
    ) -> ClauseRef {
        let mut header = ClauseHeader::new();
        header.set_learnt_on_state(0);
        header.set_glue(glue);
        header.set_activity(activity);
        let cref = ClauseDb::add_clause(ctx.borrow(), header, lits);
        ClauseDb::attach_clause(ctx.borrow(), cref);
        cref
    }

    #[test]
    fn deletes_worst_half() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 20);

        let lits = |offset: usize| {
            (0..3)
                .map(|i| Var::from_index(offset + i).positive())
                .collect::<Vec<_>>()
        };

        let good = add_learnt(ctx.borrow(), &lits(0), 2, 0.0);
        let binary = add_learnt(ctx.borrow(), &lits(3)[..2], 9, 0.0);
        let bad_active = add_learnt(ctx.borrow(), &lits(6), 8, 5.0);
        let bad_inactive = add_learnt(ctx.borrow(), &lits(9), 8, 1.0);
        let worst = add_learnt(ctx.borrow(), &lits(12), 10, 7.0);
        let locked = add_learnt(ctx.borrow(), &lits(15), 12, 0.0);

        // A clause propagating its first literal is the reason of that assignment.
        for i in 16..18 {
            enqueue_assignment(
                ctx.borrow(),
                Var::from_index(i).negative(),
                Reason::Unit,
            );
        }
        enqueue_assignment(ctx.borrow(), lit!(16), Reason::Long(locked));

        let special = reduce_learnts(ctx.borrow());

        let kept = ctx.part(ClauseDbP).learnts().to_vec();
        assert!(kept.contains(&good));
        assert!(kept.contains(&binary));
        assert!(kept.contains(&bad_active));
        assert!(kept.contains(&locked));
        assert!(!kept.contains(&worst));
        assert!(!kept.contains(&bad_inactive));
        assert_eq!(kept.len(), 4);

        assert!(ctx.part(ClauseAllocP).header(worst).deleted());
        assert_eq!(special, 0);
    }
}
