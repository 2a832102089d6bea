//! Database for clauses and at-most-k constraints.
use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::context::{parts::*, Context};
use crate::prop::Reason;

use super::{ClauseHeader, ClauseKind, ClauseRef};

/// Database for clauses and at-most-k constraints.
///
/// Unit clauses are not stored in the arena. They are assigned at level 0 and recorded in `units`,
/// so they can be reassigned after the whole trail was undone.
#[derive(Default)]
pub struct ClauseDb {
    /// Irredundant clauses and constraints in the order they were added.
    irred: Vec<ClauseRef>,
    /// Learned clauses.
    learnts: Vec<ClauseRef>,
    /// Unit clauses, both added and learned, in the order they were assigned.
    units: Vec<Lit>,
}

impl ClauseDb {
    /// Add a clause to the database.
    ///
    /// The clause is stored as learned or irredundant depending on its header. It still has to be
    /// attached to the watchlists.
    pub fn add_clause(
        mut ctx: partial!(Context, mut ClauseAllocP, mut ClauseDbP),
        header: ClauseHeader,
        lits: &[Lit],
    ) -> ClauseRef {
        let learnt = header.learnt();

        let cref = ctx.part_mut(ClauseAllocP).add_clause(header, lits);

        let db = ctx.part_mut(ClauseDbP);
        if learnt {
            db.learnts.push(cref);
        } else {
            db.irred.push(cref);
        }

        cref
    }

    /// Add the watches of a stored clause.
    pub fn attach_clause(
        mut ctx: partial!(Context, mut BinaryClausesP, mut WatchlistsP, ClauseAllocP),
        cref: ClauseRef,
    ) {
        let (alloc, mut ctx) = ctx.split_part(ClauseAllocP);
        let clause = alloc.clause(cref);
        let lits = clause.lits();

        match clause.header().kind() {
            ClauseKind::AtMost { watchers } => {
                ctx.part_mut(WatchlistsP)
                    .watch_at_most(cref, &lits[..watchers]);
            }
            ClauseKind::Plain if lits.len() == 2 => {
                ctx.part_mut(BinaryClausesP)
                    .add_binary_clause(cref, [lits[0], lits[1]]);
            }
            ClauseKind::Plain => {
                ctx.part_mut(WatchlistsP)
                    .watch_clause(cref, [lits[0], lits[1]]);
            }
        }
    }

    /// Remove the watches of a stored clause.
    ///
    /// This removes exactly the watches added by [`attach_clause`](ClauseDb::attach_clause),
    /// taking into account that propagation may have moved them.
    pub fn detach_clause(
        mut ctx: partial!(Context, mut BinaryClausesP, mut WatchlistsP, ClauseAllocP),
        cref: ClauseRef,
    ) {
        let (alloc, mut ctx) = ctx.split_part(ClauseAllocP);
        let clause = alloc.clause(cref);
        let lits = clause.lits();

        match clause.header().kind() {
            ClauseKind::AtMost { watchers } => {
                ctx.part_mut(WatchlistsP)
                    .unwatch_at_most(cref, &lits[..watchers]);
            }
            ClauseKind::Plain if lits.len() == 2 => {
                ctx.part_mut(BinaryClausesP)
                    .remove_binary_clause(cref, [lits[0], lits[1]]);
            }
            ClauseKind::Plain => {
                ctx.part_mut(WatchlistsP)
                    .unwatch_clause(cref, [lits[0], lits[1]]);
            }
        }
    }

    /// Detach a clause and release its storage.
    ///
    /// The caller is responsible for removing the reference from the learned or irredundant list.
    pub fn delete_clause(
        mut ctx: partial!(Context, mut BinaryClausesP, mut ClauseAllocP, mut WatchlistsP),
        cref: ClauseRef,
    ) {
        Self::detach_clause(ctx.borrow(), cref);
        ctx.part_mut(ClauseAllocP).free_clause(cref);
    }

    /// Whether a clause is the reason of a current assignment.
    pub fn is_locked(
        ctx: partial!(Context, AssignmentP, ClauseAllocP, ImplGraphP),
        cref: ClauseRef,
    ) -> bool {
        let lit = ctx.part(ClauseAllocP).clause(cref).lits()[0];
        ctx.part(AssignmentP).lit_is_true(lit)
            && *ctx.part(ImplGraphP).reason(lit.var()) == Reason::Long(cref)
    }

    /// Irredundant clauses and constraints in the order they were added.
    pub fn irred(&self) -> &[ClauseRef] {
        &self.irred
    }

    /// Learned clauses.
    pub fn learnts(&self) -> &[ClauseRef] {
        &self.learnts
    }

    pub fn learnts_mut(&mut self) -> &mut Vec<ClauseRef> {
        &mut self.learnts
    }

    /// Unit clauses in assignment order.
    pub fn units(&self) -> &[Lit] {
        &self.units
    }

    pub fn add_unit(&mut self, lit: Lit) {
        self.units.push(lit);
    }

    /// Drop the irredundant clauses beyond the first `count`.
    ///
    /// Returns the dropped references, whose clauses still need to be deleted.
    pub fn truncate_irred(&mut self, count: usize) -> Vec<ClauseRef> {
        self.irred.split_off(count.min(self.irred.len()))
    }

    /// Drop the unit clauses beyond the first `count`.
    pub fn truncate_units(&mut self, count: usize) {
        self.units.truncate(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{cnf, lit};

    use crate::context::set_var_count;
    use crate::prop::{enqueue_assignment, propagate};

    #[test]
    fn detach_after_watches_moved() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 6);

        let clauses = cnf![
            1, 2, 3, 4;
            -1, 5;
            -2, -3, 6;
        ];

        let mut crefs = vec![];
        for clause in clauses.iter() {
            let cref = ClauseDb::add_clause(ctx.borrow(), ClauseHeader::new(), clause);
            ClauseDb::attach_clause(ctx.borrow(), cref);
            crefs.push(cref);
        }

        let mut header = ClauseHeader::new();
        header.set_at_most_watchers(3);
        let at_most = ClauseDb::add_clause(ctx.borrow(), header, &[lit!(4), lit!(5), lit!(6)]);
        ClauseDb::attach_clause(ctx.borrow(), at_most);

        assert_eq!(ctx.part(ClauseDbP).irred().len(), 4);
        assert_eq!(ctx.part(BinaryClausesP).count(), 1);

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::Unit);
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        for &cref in crefs.iter().chain(Some(&at_most)) {
            ClauseDb::delete_clause(ctx.borrow(), cref);
        }

        assert_eq!(ctx.part(BinaryClausesP).count(), 0);
        assert_eq!(ctx.part(ClauseAllocP).len(), 0);

        let watchlists = ctx.part_mut(WatchlistsP);
        for code in 0..12 {
            let lit = cardsat_formula::Lit::from_code(code);
            assert!(watchlists.watched_by_mut(lit).is_empty());
            assert!(watchlists.at_most_by_mut(lit).is_empty());
        }
    }
}
