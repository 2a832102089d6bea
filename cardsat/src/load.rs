//! Loading clauses and at-most-k constraints into the solver.
//!
//! Everything is loaded at decision level 0, where the current assignment only contains unit
//! clauses and their consequences. New clauses are simplified against that assignment before they
//! are stored.
use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::clause::{ClauseDb, ClauseHeader};
use crate::context::{parts::*, Context};
use crate::handler::Proposition;
use crate::proof::ProofStep;
use crate::prop::{enqueue_assignment, propagate, Reason};
use crate::state::SatState;

/// Adds a clause to the current formula.
///
/// Removes duplicated and false literals, ignores satisfied and tautological clauses (eg. x v -x v
/// y) and dispatches among empty, unit and longer clauses. Unit clauses are propagated right away.
///
/// Returns `false` if the formula is now known to be unsatisfiable.
pub fn load_clause(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut ProofP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut WatchlistsP,
    ),
    input_lits: &[Lit],
    proposition: Option<Proposition>,
) -> bool {
    debug_assert_eq!(ctx.part(TrailP).current_level(), 0);

    ctx.part_mut(ProofP).add_original(input_lits, proposition);

    if ctx.part(SolverStateP).is_unsat() {
        return false;
    }
    ctx.part_mut(SolverStateP).invalidate_result();

    let (tmp_data, mut ctx) = ctx.split_part_mut(TmpDataP);
    let lits = &mut tmp_data.lits;
    lits.clear();
    lits.extend_from_slice(input_lits);
    lits.sort_unstable();
    lits.dedup();

    let mut has_assigned = false;
    let mut last = None;
    let mut kept = 0;

    for index in 0..lits.len() {
        let lit = lits[index];
        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => return true,
            Some(false) => has_assigned = true,
            None => {
                // Complementary literals are adjacent after sorting.
                if last == Some(!lit) {
                    return true;
                }
                last = Some(lit);
                lits[kept] = lit;
                kept += 1;
            }
        }
    }

    lits.truncate(kept);

    if has_assigned && ctx.part(ProofP).is_active() {
        let proof = ctx.part_mut(ProofP);
        proof.add_step(ProofStep::AddClause {
            clause: lits.clone(),
        });
        proof.add_step(ProofStep::DeleteClause {
            clause: input_lits.to_vec(),
        });
    }

    match lits[..] {
        [] => {
            set_unsat(ctx.borrow());
            false
        }
        [lit] => {
            enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
            ctx.part_mut(ClauseDbP).add_unit(lit);
            if propagate(ctx.borrow()).is_err() {
                set_unsat(ctx.borrow());
                false
            } else {
                true
            }
        }
        _ => {
            let cref = ClauseDb::add_clause(ctx.borrow(), ClauseHeader::new(), lits);
            ClauseDb::attach_clause(ctx.borrow(), cref);
            true
        }
    }
}

/// Adds a constraint requiring at most `k` of the given literals to be true.
///
/// The literals must be distinct. Literals already true use up part of the bound and false literals
/// are dropped. A pair of complementary literals always contributes exactly one true literal. A
/// bound of zero turns into unit clauses and a bound not below the literal count makes the
/// constraint trivially true.
///
/// Returns `false` if the formula is now known to be unsatisfiable.
pub fn load_at_most(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut ProofP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut WatchlistsP,
    ),
    input_lits: &[Lit],
    k: usize,
) -> bool {
    debug_assert_eq!(ctx.part(TrailP).current_level(), 0);

    if ctx.part(SolverStateP).is_unsat() {
        return false;
    }
    ctx.part_mut(SolverStateP).invalidate_result();

    let (tmp_data, mut ctx) = ctx.split_part_mut(TmpDataP);
    let lits = &mut tmp_data.lits;
    lits.clear();
    lits.extend_from_slice(input_lits);
    lits.sort_unstable();

    let mut true_count = 0;

    let mut kept = 0;
    for index in 0..lits.len() {
        let lit = lits[index];
        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => true_count += 1,
            Some(false) => (),
            None => {
                if kept > 0 && lits[kept - 1] == !lit {
                    kept -= 1;
                    true_count += 1;
                } else {
                    lits[kept] = lit;
                    kept += 1;
                }
            }
        }
    }
    lits.truncate(kept);

    let k = match k.checked_sub(true_count) {
        Some(k) => k,
        None => {
            set_unsat(ctx.borrow());
            return false;
        }
    };

    if k >= lits.len() {
        return true;
    }

    if k == 0 {
        for &lit in lits.iter() {
            enqueue_assignment(ctx.borrow(), !lit, Reason::Unit);
            ctx.part_mut(ClauseDbP).add_unit(!lit);
        }
        if propagate(ctx.borrow()).is_err() {
            set_unsat(ctx.borrow());
            return false;
        }
        return true;
    }

    let mut header = ClauseHeader::new();
    header.set_at_most_watchers(lits.len() - k + 1);
    let cref = ClauseDb::add_clause(ctx.borrow(), header, lits);
    ClauseDb::attach_clause(ctx.borrow(), cref);
    true
}

/// Mark the formula as unsatisfiable and record the contradiction.
fn set_unsat(mut ctx: partial!(Context, mut ProofP, mut SolverStateP)) {
    ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
    ctx.part_mut(ProofP).add_step(ProofStep::Contradiction);
}
