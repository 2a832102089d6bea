//! Saving and restoring the solver state.
//!
//! A [`Snapshot`] records the sizes of all growing parts of the solver. Loading it removes
//! everything added since: variables, irredundant clauses, unit clauses, proof steps and the
//! clauses learned from them. Learned clauses are tagged with the id of the next snapshot at the
//! time they were derived, so those derived from removed clauses can be identified.
//!
//! Only snapshots on a stack of valid states can be loaded. Loading a snapshot invalidates all
//! snapshots taken after it.
use log::debug;
use partial_ref::{partial, PartialRef};

use crate::clause::ClauseDb;
use crate::context::{parts::*, set_var_count, Context};
use crate::prop::{complete_backtrack, enqueue_assignment, propagate, Reason};
use crate::solver::SolverError;
use crate::state::SatState;

/// Token for a saved solver state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    id: usize,
    unsat: bool,
    var_count: usize,
    irred_count: usize,
    unit_count: usize,
    original_len: usize,
    steps_len: usize,
}

impl Snapshot {
    /// Snapshot ids increase with every saved state.
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Snapshot bookkeeping.
#[derive(Default)]
pub struct Incremental {
    next_state_id: usize,
    valid_states: Vec<usize>,
}

impl Incremental {
    /// Id the next snapshot will get.
    pub fn next_state_id(&self) -> usize {
        self.next_state_id
    }

    /// Ids of the snapshots that can still be loaded, oldest first.
    pub fn valid_states(&self) -> &[usize] {
        &self.valid_states
    }

    /// Invalidate the most recent snapshot if it has the given id.
    pub fn discard_state(&mut self, id: usize) {
        if self.valid_states.last() == Some(&id) {
            self.valid_states.pop();
        }
    }
}

/// Save the current state.
pub fn save_state(
    mut ctx: partial!(
        Context,
        mut IncrementalP,
        AssignmentP,
        ClauseDbP,
        ProofP,
        SolverStateP,
    ),
) -> Snapshot {
    let incremental = ctx.part_mut(IncrementalP);
    let id = incremental.next_state_id;
    incremental.next_state_id += 1;
    incremental.valid_states.push(id);

    let db = ctx.part(ClauseDbP);
    let proof = ctx.part(ProofP);

    let snapshot = Snapshot {
        id,
        unsat: ctx.part(SolverStateP).is_unsat(),
        var_count: ctx.part(AssignmentP).assignment().len(),
        irred_count: db.irred().len(),
        unit_count: db.units().len(),
        original_len: proof.original_len(),
        steps_len: proof.steps_len(),
    };

    debug!("saved state {}", id);

    snapshot
}

/// Restore a saved state.
///
/// Fails if the snapshot is no longer valid. The solver is at decision level 0 afterwards.
pub fn load_state(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut IncrementalP,
        mut ModelP,
        mut ProofP,
        mut SelectionOrderP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VariablesP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    snapshot: &Snapshot,
) -> Result<(), SolverError> {
    let incremental = ctx.part_mut(IncrementalP);
    let index = incremental
        .valid_states
        .iter()
        .rposition(|&id| id == snapshot.id)
        .ok_or(SolverError::StaleState { id: snapshot.id })?;
    incremental.valid_states.truncate(index + 1);

    complete_backtrack(ctx.borrow());

    ctx.part_mut(SolverStateP).sat_state = if snapshot.unsat {
        SatState::Unsat
    } else {
        SatState::Unknown
    };

    let removed = ctx.part_mut(ClauseDbP).truncate_irred(snapshot.irred_count);
    for cref in removed {
        ClauseDb::delete_clause(ctx.borrow(), cref);
    }

    let mut learnts = std::mem::replace(ctx.part_mut(ClauseDbP).learnts_mut(), vec![]);
    learnts.retain(|&cref| {
        let derived_later = ctx
            .part(ClauseAllocP)
            .header(cref)
            .learnt_on_state()
            .map_or(false, |state| state > snapshot.id);
        if derived_later {
            ClauseDb::delete_clause(ctx.borrow(), cref);
        }
        !derived_later
    });
    *ctx.part_mut(ClauseDbP).learnts_mut() = learnts;

    let var_count = snapshot
        .var_count
        .min(ctx.part(AssignmentP).assignment().len());
    set_var_count(ctx.borrow(), var_count);

    ctx.part_mut(ModelP).clear();
    ctx.part_mut(AssumptionsP).clear_conflict();
    ctx.part_mut(ProofP)
        .truncate(snapshot.original_len, snapshot.steps_len);

    ctx.part_mut(ClauseDbP).truncate_units(snapshot.unit_count);

    if !ctx.part(SolverStateP).is_unsat() {
        let (db, mut ctx) = ctx.split_part(ClauseDbP);
        for &lit in db.units() {
            match ctx.part(AssignmentP).lit_value(lit) {
                Some(true) => (),
                Some(false) => {
                    ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
                    break;
                }
                None => enqueue_assignment(ctx.borrow(), lit, Reason::Unit),
            }
        }
        if !ctx.part(SolverStateP).is_unsat() && propagate(ctx.borrow()).is_err() {
            ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        }
    }

    debug!(
        "loaded state {}, {} irredundant and {} learned clauses remain",
        snapshot.id,
        ctx.part(ClauseDbP).irred().len(),
        ctx.part(ClauseDbP).learnts().len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits, Var};

    use crate::clause::ClauseHeader;
    use crate::load::{load_at_most, load_clause};

    #[test]
    fn rollback_removes_later_additions() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 3);
        ctx.part_mut(ProofP).set_enabled(true);

        assert!(load_clause(ctx.borrow(), &lits![1, 2, 3], None));
        assert!(load_clause(ctx.borrow(), &lits![-3], None));

        let snapshot = save_state(ctx.borrow());
        assert_eq!(snapshot.id(), 0);

        set_var_count(ctx.borrow(), 5);
        ctx.part_mut(VariablesP).set_name(Var::from_index(4), "e");
        assert!(load_clause(ctx.borrow(), &lits![-1, 4], None));
        assert!(load_clause(ctx.borrow(), &lits![5], None));
        assert!(load_at_most(ctx.borrow(), &lits![1, 2, 4], 1));

        let mut header = ClauseHeader::new();
        header.set_learnt_on_state(ctx.part(IncrementalP).next_state_id());
        let learnt = ClauseDb::add_clause(ctx.borrow(), header, &lits![2, 4, 5]);
        ClauseDb::attach_clause(ctx.borrow(), learnt);

        assert!(!load_clause(ctx.borrow(), &lits![-5], None));
        assert!(ctx.part(SolverStateP).is_unsat());

        load_state(ctx.borrow(), &snapshot).unwrap();

        assert!(!ctx.part(SolverStateP).is_unsat());
        assert_eq!(ctx.part(AssignmentP).assignment().len(), 3);
        assert_eq!(ctx.part(VariablesP).var_by_name("e"), None);
        assert_eq!(ctx.part(ClauseDbP).irred().len(), 1);
        assert!(ctx.part(ClauseDbP).learnts().is_empty());
        assert_eq!(ctx.part(ClauseDbP).units(), &lits![-3]);
        assert_eq!(ctx.part(BinaryClausesP).count(), 0);
        assert_eq!(ctx.part(ClauseAllocP).len(), 1);
        assert_eq!(ctx.part(ProofP).original_len(), 2);
        assert_eq!(ctx.part(ProofP).steps_len(), 0);
        assert_eq!(ctx.part(TrailP).trail(), &lits![-3]);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(-3)));

        // loading again is allowed
        load_state(ctx.borrow(), &snapshot).unwrap();
        assert_eq!(ctx.part(IncrementalP).valid_states(), &[0]);
    }

    #[test]
    fn younger_snapshots_become_stale() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 2);

        let first = save_state(ctx.borrow());
        let second = save_state(ctx.borrow());
        let third = save_state(ctx.borrow());

        load_state(ctx.borrow(), &second).unwrap();
        assert_eq!(
            load_state(ctx.borrow(), &third),
            Err(SolverError::StaleState { id: 2 })
        );
        load_state(ctx.borrow(), &first).unwrap();
        assert_eq!(
            load_state(ctx.borrow(), &second),
            Err(SolverError::StaleState { id: 1 })
        );

        let fourth = save_state(ctx.borrow());
        assert_eq!(fourth.id(), 3);
    }

    #[test]
    fn learned_clauses_of_older_states_survive() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 4);

        let mut header = ClauseHeader::new();
        header.set_learnt_on_state(ctx.part(IncrementalP).next_state_id());
        let learnt = ClauseDb::add_clause(ctx.borrow(), header, &lits![1, 2, 3]);
        ClauseDb::attach_clause(ctx.borrow(), learnt);

        let snapshot = save_state(ctx.borrow());
        assert!(load_clause(ctx.borrow(), &lits![-1], None));
        load_state(ctx.borrow(), &snapshot).unwrap();

        assert_eq!(ctx.part(ClauseDbP).learnts(), &[learnt]);
        assert!(ctx.part(ClauseDbP).units().is_empty());
        assert!(ctx.part(AssignmentP).lit_is_unk(lit!(1)));
    }
}
