//! Solving under assumptions.
//!
//! Assumptions are literals that are treated as unit clauses for a single solve call. They are
//! enqueued as the first decisions, one decision level per assumption. When an assumption turns out
//! to be false, the conflict clause consisting of negated assumptions that imply its negation is
//! derived from the implication graph.
use partial_ref::{partial, PartialRef};

use cardsat_formula::Lit;

use crate::context::{parts::*, Context};
use crate::handler::Proposition;
use crate::prop::{enqueue_assignment, Reason};

/// Assumptions of the current solve call and the conflict of the last one.
#[derive(Default)]
pub struct Assumptions {
    lits: Vec<Lit>,
    /// Proposition of each assumption.
    propositions: Vec<Option<Proposition>>,
    /// Negated assumptions that are unsatisfiable together with the formula.
    conflict: Vec<Lit>,
    /// Assumptions of the last solve call, used to report failed propositions.
    failed_candidates: Vec<(Lit, Option<Proposition>)>,
}

impl Assumptions {
    /// Set the assumptions for the next solve call.
    pub fn set(&mut self, lits: Vec<Lit>, propositions: Vec<Option<Proposition>>) {
        debug_assert!(propositions.is_empty() || propositions.len() == lits.len());
        self.lits = lits;
        self.propositions = propositions;
    }

    /// Remove all assumptions.
    ///
    /// The conflict of the last solve call stays available.
    pub fn clear(&mut self) {
        let propositions = &self.propositions;
        self.failed_candidates.clear();
        self.failed_candidates.extend(
            self.lits
                .iter()
                .enumerate()
                .map(|(index, &lit)| (lit, propositions.get(index).cloned().flatten())),
        );
        self.lits.clear();
        self.propositions.clear();
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    fn proposition(&self, index: usize) -> Option<Proposition> {
        self.propositions.get(index).cloned().flatten()
    }

    /// Forget the conflict of the last solve call.
    pub fn clear_conflict(&mut self) {
        self.conflict.clear();
        self.failed_candidates.clear();
    }

    /// The clause of negated assumptions that caused the last unsatisfiable result.
    ///
    /// Empty unless the last solve call failed because of its assumptions.
    pub fn conflict(&self) -> &[Lit] {
        &self.conflict
    }

    /// The assumptions responsible for the last unsatisfiable result.
    pub fn failed_assumptions(&self) -> impl Iterator<Item = Lit> + '_ {
        self.conflict.iter().map(|&lit| !lit)
    }

    /// Propositions of the assumptions responsible for the last unsatisfiable result.
    pub fn failed_propositions(&self) -> Vec<&Proposition> {
        let mut propositions = vec![];
        for failed in self.failed_assumptions() {
            for (lit, proposition) in self.failed_candidates.iter() {
                if *lit == failed {
                    if let Some(proposition) = proposition {
                        if !propositions.contains(&proposition) {
                            propositions.push(proposition);
                        }
                    }
                }
            }
        }
        propositions
    }
}

/// Result of [`enqueue_assumption`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EnqueueAssumption {
    /// An assumption was enqueued and has to be propagated.
    Enqueued,
    /// All assumptions hold.
    Done,
    /// An assumption is false, the conflict is stored in [`Assumptions`].
    Conflict,
}

/// Enqueue the next assumption that is not yet assigned.
///
/// Every assumption occupies one decision level, even if it already holds.
pub fn enqueue_assumption(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ImplGraphP,
        mut ProofP,
        mut TmpDataP,
        mut TrailP,
        ClauseAllocP,
    ),
) -> EnqueueAssumption {
    loop {
        let level = ctx.part(TrailP).current_level();
        let assumptions = ctx.part(AssumptionsP);
        let lit = match assumptions.lits.get(level) {
            Some(&lit) => lit,
            None => return EnqueueAssumption::Done,
        };

        match ctx.part(AssignmentP).lit_value(lit) {
            Some(true) => ctx.part_mut(TrailP).new_decision_level(),
            Some(false) => {
                let proposition = assumptions.proposition(level);
                ctx.part_mut(ProofP).add_original(&[lit], proposition);
                analyze_assumption_conflict(ctx.borrow(), !lit);
                return EnqueueAssumption::Conflict;
            }
            None => {
                let proposition = assumptions.proposition(level);
                ctx.part_mut(ProofP).add_original(&[lit], proposition);
                ctx.part_mut(TrailP).new_decision_level();
                enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
                return EnqueueAssumption::Enqueued;
            }
        }
    }
}

/// Derive the conflict clause for a false assumption.
///
/// `lit` is the true negation of the failed assumption. Starting from it, the trail is walked
/// backwards, replacing propagated literals by their reasons. Decisions reached this way are
/// assumptions and their negations form the conflict clause together with `lit`.
fn analyze_assumption_conflict(
    mut ctx: partial!(
        Context,
        mut AssumptionsP,
        mut TmpDataP,
        AssignmentP,
        ClauseAllocP,
        ImplGraphP,
        TrailP,
    ),
    lit: Lit,
) {
    let (assumptions, mut ctx) = ctx.split_part_mut(AssumptionsP);
    let (tmp_data, ctx) = ctx.split_part_mut(TmpDataP);

    let conflict = &mut assumptions.conflict;
    conflict.clear();
    conflict.push(lit);

    let trail = ctx.part(TrailP);
    let impl_graph = ctx.part(ImplGraphP);

    if trail.current_level() == 0 || impl_graph.level(lit.var()) == 0 {
        return;
    }

    // Indexed by the code of the true literal.
    let seen = &mut tmp_data.flags;
    seen[lit.code()] = true;

    for &trail_lit in trail.trail()[trail.level_start(1)..].iter().rev() {
        if !seen[trail_lit.code()] {
            continue;
        }
        seen[trail_lit.code()] = false;

        let reason = impl_graph.reason(trail_lit.var());
        if reason.is_unit() {
            debug_assert!(impl_graph.level(trail_lit.var()) > 0);
            conflict.push(!trail_lit);
        } else {
            for antecedent in reason.lits(ctx.part(ClauseAllocP), ctx.part(AssignmentP)) {
                if impl_graph.level(antecedent.var()) > 0 {
                    seen[(!antecedent).code()] = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits};

    use crate::clause::{ClauseDb, ClauseHeader};
    use crate::context::set_var_count;
    use crate::load::load_clause;
    use crate::prop::propagate;

    fn run_assumptions(
        mut ctx: partial!(
            Context,
            mut AssignmentP,
            mut AssumptionsP,
            mut ClauseAllocP,
            mut ImplGraphP,
            mut ProofP,
            mut TmpDataP,
            mut TrailP,
            mut WatchlistsP,
            BinaryClausesP,
        ),
    ) -> EnqueueAssumption {
        loop {
            assert_eq!(propagate(ctx.borrow()), Ok(()));
            match enqueue_assumption(ctx.borrow()) {
                EnqueueAssumption::Enqueued => (),
                other => return other,
            }
        }
    }

    #[test]
    fn conflict_through_binary_clauses() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 5);

        assert!(load_clause(ctx.borrow(), &lits![-1, 2], None));
        assert!(load_clause(ctx.borrow(), &lits![-2, -3, 4], None));

        ctx.part_mut(AssumptionsP).set(
            lits![1, 5, 3, -4].to_vec(),
            vec![
                Some(Proposition::new("a")),
                None,
                Some(Proposition::new("c")),
                Some(Proposition::new("d")),
            ],
        );

        assert_eq!(run_assumptions(ctx.borrow()), EnqueueAssumption::Conflict);

        let assumptions = ctx.part_mut(AssumptionsP);
        let mut conflict = assumptions.conflict().to_vec();
        conflict.sort();
        assert_eq!(conflict, lits![-1, -3, 4]);

        assumptions.clear();
        assert!(assumptions.lits().is_empty());
        let mut failed: Vec<_> = assumptions.failed_assumptions().collect();
        failed.sort();
        assert_eq!(failed, lits![1, 3, -4]);
        let mut propositions: Vec<_> = assumptions
            .failed_propositions()
            .into_iter()
            .map(|proposition| proposition.as_str())
            .collect();
        propositions.sort();
        assert_eq!(propositions, vec!["a", "c", "d"]);

        assert!(ctx.part(TmpDataP).flags.iter().all(|&flag| !flag));
    }

    #[test]
    fn conflict_through_at_most() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 4);

        let mut header = ClauseHeader::new();
        header.set_at_most_watchers(3);
        let cref = ClauseDb::add_clause(ctx.borrow(), header, &lits![1, 2, 3]);
        ClauseDb::attach_clause(ctx.borrow(), cref);

        ctx.part_mut(AssumptionsP)
            .set(lits![4, 1, 2, 3].to_vec(), vec![]);

        assert_eq!(run_assumptions(ctx.borrow()), EnqueueAssumption::Conflict);

        // 2 is false because of 1, the assumption 4 is not involved
        let mut conflict = ctx.part(AssumptionsP).conflict().to_vec();
        conflict.sort();
        assert_eq!(conflict, lits![-1, -2]);
    }

    #[test]
    fn level_0_falsified_assumption() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 3);

        assert!(load_clause(ctx.borrow(), &lits![-3], None));
        ctx.part_mut(AssumptionsP).set(lits![1, 3].to_vec(), vec![]);

        assert_eq!(run_assumptions(ctx.borrow()), EnqueueAssumption::Conflict);
        assert_eq!(ctx.part(AssumptionsP).conflict(), &[lit!(-3)]);
    }

    #[test]
    fn satisfied_assumptions_take_a_level_each() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 3);

        assert!(load_clause(ctx.borrow(), &lits![-1, 2], None));
        ctx.part_mut(AssumptionsP).set(lits![1, 2, -3].to_vec(), vec![]);

        assert_eq!(run_assumptions(ctx.borrow()), EnqueueAssumption::Done);
        assert_eq!(ctx.part(TrailP).current_level(), 3);
        assert!(ctx.part(AssumptionsP).conflict().is_empty());
    }
}
