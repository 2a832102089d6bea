//! Binary clauses and their propagation.
use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::clause::ClauseRef;
use crate::context::{parts::*, Context};

use super::enqueue_assignment;
use super::{Conflict, Reason};

/// An implication stored for a binary clause.
#[derive(Copy, Clone, Debug)]
pub struct BinaryWatch {
    /// The clause in the arena, used for removal.
    pub cref: ClauseRef,
    /// The other literal of the clause.
    pub implied: Lit,
}

/// Binary clauses.
///
/// Binary clauses are also stored in the clause arena, so that they can be tracked by the clause
/// database like any other clause. Propagation only looks at these implication lists.
#[derive(Default)]
pub struct BinaryClauses {
    by_lit: Vec<Vec<BinaryWatch>>,
    count: usize,
}

impl BinaryClauses {
    /// Update structures for a new variable count.
    ///
    /// When shrinking, no binary clause may refer to the removed variables.
    pub fn set_var_count(&mut self, count: usize) {
        self.by_lit.resize(count * 2, vec![]);
    }

    /// Add a binary clause.
    pub fn add_binary_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for i in 0..2 {
            self.by_lit[(!lits[i]).code()].push(BinaryWatch {
                cref,
                implied: lits[i ^ 1],
            });
        }
        self.count += 1;
    }

    /// Remove a binary clause.
    pub fn remove_binary_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for &lit in lits.iter() {
            let watches = &mut self.by_lit[(!lit).code()];
            if let Some(pos) = watches.iter().position(|watch| watch.cref == cref) {
                watches.swap_remove(pos);
            }
        }
        self.count -= 1;
    }

    /// Implications of a given literal
    pub fn implied(&self, lit: Lit) -> impl Iterator<Item = Lit> + '_ {
        self.by_lit[lit.code()].iter().map(|watch| watch.implied)
    }

    /// The binary clause that implies `implied` once `antecedent` is false.
    pub fn clause_ref(&self, implied: Lit, antecedent: Lit) -> Option<ClauseRef> {
        self.by_lit[(!antecedent).code()]
            .iter()
            .find(|watch| watch.implied == implied)
            .map(|watch| watch.cref)
    }

    /// Number of binary clauses.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Propagate all literals implied by the given literal via binary clauses.
///
/// On conflict return the binary clause propgating the conflicting assignment.
pub fn propagate_binary(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        BinaryClausesP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let (binary_clauses, mut ctx) = ctx.split_part(BinaryClausesP);

    for implied in binary_clauses.implied(lit) {
        let assignment = ctx.part(AssignmentP);

        if assignment.lit_is_false(implied) {
            return Err(Conflict::Binary([implied, !lit]));
        } else if !assignment.lit_is_true(implied) {
            enqueue_assignment(ctx.borrow(), implied, Reason::Binary([!lit]));
        }
    }

    Ok(())
}
