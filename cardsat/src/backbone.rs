//! Backbone computation.
//!
//! The backbone of a formula is the set of literals that are true in every model. It is computed
//! by solving once and then checking each remaining candidate literal with a solve call that
//! assumes its negation. Every model found on the way rules out the candidates it falsifies.
//!
//! Candidates are also dropped when they are rotatable in a model: flipping the variable yields
//! another model, because no clause depends on it as its only true literal and no at-most-k
//! constraint is tight on its negation.
use std::collections::BTreeSet;

use log::{debug, trace};
use partial_ref::{partial, PartialRef};
use rustc_hash::{FxHashMap, FxHashSet};

use cardsat_formula::{Lit, Var};

use crate::clause::ClauseKind;
use crate::context::{parts::*, Context};
use crate::handler::{Outcome, SolverEvent, SolverHandler};
use crate::incremental::{load_state, save_state};
use crate::search::solve;
use crate::solver::SolverError;

/// Which backbone literals to compute.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BackboneType {
    /// Positive and negative backbone literals and the variables that are not in the backbone.
    PositiveAndNegative,
    OnlyPositive,
    OnlyNegative,
}

impl BackboneType {
    fn includes(self, polarity: bool) -> bool {
        match self {
            BackboneType::PositiveAndNegative => true,
            BackboneType::OnlyPositive => polarity,
            BackboneType::OnlyNegative => !polarity,
        }
    }
}

/// Result of a backbone computation.
///
/// Each set is only present when it was requested by the [`BackboneType`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Backbone {
    sat: bool,
    positive: Option<BTreeSet<Var>>,
    negative: Option<BTreeSet<Var>>,
    optional: Option<BTreeSet<Var>>,
}

impl Backbone {
    fn unsat() -> Backbone {
        Backbone {
            sat: false,
            positive: None,
            negative: None,
            optional: None,
        }
    }

    /// Whether the formula is satisfiable. An unsatisfiable formula has no backbone.
    pub fn is_sat(&self) -> bool {
        self.sat
    }

    /// Variables that are true in every model.
    pub fn positive(&self) -> Option<&BTreeSet<Var>> {
        self.positive.as_ref()
    }

    /// Variables that are false in every model.
    pub fn negative(&self) -> Option<&BTreeSet<Var>> {
        self.negative.as_ref()
    }

    /// Variables that are true in some model and false in another.
    pub fn optional(&self) -> Option<&BTreeSet<Var>> {
        self.optional.as_ref()
    }

    /// All computed backbone literals, positive ones first.
    pub fn literals(&self) -> Vec<Lit> {
        let positive = self.positive.iter().flatten().map(|var| var.positive());
        let negative = self.negative.iter().flatten().map(|var| var.negative());
        positive.chain(negative).collect()
    }
}

/// Compute the backbone of the current formula restricted to the given variables.
///
/// Variables unknown to the solver can take either value and are reported as optional. The
/// solver state is restored afterwards, which also discards the last model.
pub fn compute_backbone(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut IncrementalP,
        mut ModelP,
        mut ProofP,
        mut ScheduleP,
        mut SelectionOrderP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VariablesP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
    variables: &[Var],
    backbone_type: BackboneType,
    handler: &mut dyn SolverHandler,
) -> Result<Outcome<Backbone>, SolverError> {
    if !handler.should_resume(SolverEvent::BackboneStarted) {
        return Ok(Outcome::Canceled(SolverEvent::BackboneStarted));
    }

    let snapshot = save_state(ctx.borrow());
    ctx.part_mut(AssignmentP).set_save_phases(false);

    let values = search_backbone(ctx.borrow(), variables, backbone_type, handler);

    ctx.part_mut(AssignmentP).set_save_phases(true);
    load_state(ctx.borrow(), &snapshot)?;
    ctx.part_mut(IncrementalP).discard_state(snapshot.id());

    Ok(values.map(|values| match values {
        None => Backbone::unsat(),
        Some(values) => build_backbone(variables, backbone_type, &values),
    }))
}

/// Find the backbone values of the relevant variables.
///
/// Returns `None` if the formula is unsatisfiable.
fn search_backbone(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseAllocP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut ModelP,
        mut ProofP,
        mut ScheduleP,
        mut SelectionOrderP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        IncrementalP,
        SolverConfigP,
    ),
    variables: &[Var],
    backbone_type: BackboneType,
    handler: &mut dyn SolverHandler,
) -> Outcome<Option<FxHashMap<Var, bool>>> {
    match solve(ctx.borrow(), handler) {
        Outcome::Canceled(event) => return Outcome::Canceled(event),
        Outcome::Done(false) => return Outcome::Done(None),
        Outcome::Done(true) => (),
    }

    let var_count = ctx.part(AssignmentP).assignment().len();

    let mut values = FxHashMap::default();
    // Backbone literals found so far, assumed in all later solve calls.
    let mut assumptions = vec![];
    let mut candidates = vec![];

    {
        let pinned = pinned_lits(ctx.borrow());
        let assignment = ctx.part(AssignmentP);
        let model = ctx.part(ModelP);

        let mut seen = FxHashSet::default();
        for &var in variables {
            if var.index() >= var_count || !seen.insert(var) {
                continue;
            }
            if let Some(value) = assignment.var_value(var) {
                values.insert(var, value);
                assumptions.push(var.lit(value));
            } else {
                let value = model.var_value(var);
                let lit = var.lit(value);
                if backbone_type.includes(value) && pinned[lit.code()] {
                    candidates.push(lit);
                }
            }
        }
    }

    debug!(
        "backbone search: {} level 0 literals, {} candidates",
        assumptions.len(),
        candidates.len()
    );

    while let Some(lit) = candidates.pop() {
        if !handler.should_resume(SolverEvent::BackboneCandidate) {
            return Outcome::Canceled(SolverEvent::BackboneCandidate);
        }

        assumptions.push(!lit);
        ctx.part_mut(AssumptionsP).set(assumptions.clone(), vec![]);
        let outcome = solve(ctx.borrow(), handler);
        ctx.part_mut(AssumptionsP).clear();
        assumptions.pop();

        match outcome {
            Outcome::Canceled(event) => return Outcome::Canceled(event),
            Outcome::Done(false) => {
                trace!("backbone literal {:?}", lit);
                values.insert(lit.var(), lit.is_positive());
                assumptions.push(lit);
            }
            Outcome::Done(true) => {
                let pinned = pinned_lits(ctx.borrow());
                let assignment = ctx.part(AssignmentP);
                let model = ctx.part(ModelP);
                candidates.retain(|&candidate| {
                    if let Some(value) = assignment.var_value(candidate.var()) {
                        values.insert(candidate.var(), value);
                        assumptions.push(candidate.var().lit(value));
                        false
                    } else {
                        model.lit_is_true(candidate) && pinned[candidate.code()]
                    }
                });
            }
        }
    }

    Outcome::Done(Some(values))
}

/// Literals that cannot be flipped in the current model without falsifying an irredundant
/// clause or constraint.
///
/// Indexed by literal code.
fn pinned_lits(ctx: partial!(Context, ClauseAllocP, ClauseDbP, ModelP)) -> Vec<bool> {
    let model = ctx.part(ModelP);
    let alloc = ctx.part(ClauseAllocP);

    let mut pinned = vec![false; model.assignment().len() * 2];

    for &cref in ctx.part(ClauseDbP).irred() {
        let clause = alloc.clause(cref);
        let lits = clause.lits();
        match clause.header().kind() {
            ClauseKind::Plain => {
                let mut true_lits = lits.iter().filter(|&&lit| model.lit_is_true(lit));
                if let (Some(&lit), None) = (true_lits.next(), true_lits.next()) {
                    pinned[lit.code()] = true;
                }
            }
            ClauseKind::AtMost { watchers } => {
                let k = lits.len() + 1 - watchers;
                let true_count = lits.iter().filter(|&&lit| model.lit_is_true(lit)).count();
                if true_count >= k {
                    for &lit in lits.iter().filter(|&&lit| !model.lit_is_true(lit)) {
                        pinned[(!lit).code()] = true;
                    }
                }
            }
        }
    }

    pinned
}

fn build_backbone(
    variables: &[Var],
    backbone_type: BackboneType,
    values: &FxHashMap<Var, bool>,
) -> Backbone {
    let mut backbone = Backbone {
        sat: true,
        positive: Some(BTreeSet::new()).filter(|_| backbone_type.includes(true)),
        negative: Some(BTreeSet::new()).filter(|_| backbone_type.includes(false)),
        optional: Some(BTreeSet::new())
            .filter(|_| backbone_type == BackboneType::PositiveAndNegative),
    };

    for &var in variables {
        let set = match values.get(&var) {
            Some(true) => &mut backbone.positive,
            Some(false) => &mut backbone.negative,
            None => &mut backbone.optional,
        };
        if let Some(set) = set {
            set.insert(var);
        }
    }

    backbone
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits, var, vars};

    use crate::clause::{ClauseDb, ClauseHeader};
    use crate::context::{configure, set_var_count};
    use crate::handler::NoHandler;
    use crate::load::{load_at_most, load_clause};
    use crate::model::store_model;
    use crate::prop::enqueue_assignment;
    use crate::prop::Reason;

    fn set_model(
        mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut ModelP, mut TrailP),
        lits: &[Lit],
    ) {
        ctx.part_mut(TrailP).new_decision_level();
        for &lit in lits {
            enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
        }
        store_model(ctx.borrow());
    }

    #[test]
    fn pinned_by_binary_and_at_most() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 5);

        for clause in [&lits![1, 2][..], &lits![-2, 3, 4][..]].iter() {
            let cref = ClauseDb::add_clause(ctx.borrow(), ClauseHeader::new(), clause);
            ClauseDb::attach_clause(ctx.borrow(), cref);
        }
        let mut header = ClauseHeader::new();
        header.set_at_most_watchers(3);
        let cref = ClauseDb::add_clause(ctx.borrow(), header, &lits![3, 4, 5]);
        ClauseDb::attach_clause(ctx.borrow(), cref);

        set_model(ctx.borrow(), &lits![-1, 2, 3, -4, -5]);
        let pinned = pinned_lits(ctx.borrow());
        let pinned: Vec<_> = (0..10)
            .map(Lit::from_code)
            .filter(|lit| pinned[lit.code()])
            .collect();
        // 2 is the only true literal of [1, 2], 3 of [-2, 3, 4]. With 3 true the at-most-one
        // constraint is tight, so -4 and -5 cannot be flipped.
        assert_eq!(pinned, lits![2, 3, -4, -5]);
    }

    #[test]
    fn backbone_of_small_formula() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        configure(ctx.borrow());
        set_var_count(ctx.borrow(), 3);

        load_clause(ctx.borrow(), &lits![1, 2], None);
        load_clause(ctx.borrow(), &lits![-2, 3], None);
        load_clause(ctx.borrow(), &lits![1], None);

        let backbone = compute_backbone(
            ctx.borrow(),
            &vars![1, 2, 3, 4],
            BackboneType::PositiveAndNegative,
            &mut NoHandler,
        )
        .unwrap()
        .done()
        .unwrap();

        assert!(backbone.is_sat());
        assert_eq!(
            backbone.positive().unwrap().iter().cloned().collect::<Vec<_>>(),
            vars![1]
        );
        assert!(backbone.negative().unwrap().is_empty());
        assert_eq!(
            backbone.optional().unwrap().iter().cloned().collect::<Vec<_>>(),
            vars![2, 3, 4]
        );
        assert_eq!(backbone.literals(), lits![1]);

        assert_eq!(ctx.part(IncrementalP).valid_states(), &[] as &[usize]);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(1)));
    }

    #[test]
    fn backbone_through_at_most() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        configure(ctx.borrow());
        set_var_count(ctx.borrow(), 4);

        // exactly one of 1, 2, 3 and 1 -> 2 leave 3 or 2 as choices, 1 is false in every model
        load_at_most(ctx.borrow(), &lits![1, 2, 3], 1);
        load_clause(ctx.borrow(), &lits![1, 2, 3], None);
        load_clause(ctx.borrow(), &lits![-1, 2], None);
        load_clause(ctx.borrow(), &lits![-4, 2], None);
        load_clause(ctx.borrow(), &lits![4, 3], None);

        for &backbone_type in [
            BackboneType::PositiveAndNegative,
            BackboneType::OnlyNegative,
            BackboneType::OnlyPositive,
        ]
        .iter()
        {
            let backbone = compute_backbone(
                ctx.borrow(),
                &vars![1, 2, 3, 4],
                backbone_type,
                &mut NoHandler,
            )
            .unwrap()
            .done()
            .unwrap();

            if backbone_type == BackboneType::OnlyPositive {
                assert!(backbone.negative().is_none());
                assert!(backbone.positive().unwrap().is_empty());
            } else {
                assert_eq!(
                    backbone.negative().unwrap().iter().cloned().collect::<Vec<_>>(),
                    vars![1]
                );
            }
            assert_eq!(
                backbone.optional().is_some(),
                backbone_type == BackboneType::PositiveAndNegative
            );
        }
    }

    #[test]
    fn unsat_formula_has_no_backbone() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        configure(ctx.borrow());
        set_var_count(ctx.borrow(), 1);

        load_clause(ctx.borrow(), &lits![1], None);
        load_clause(ctx.borrow(), &lits![-1], None);

        let backbone = compute_backbone(
            ctx.borrow(),
            &[var!(1)],
            BackboneType::PositiveAndNegative,
            &mut NoHandler,
        )
        .unwrap();
        assert_eq!(backbone.done().map(|backbone| backbone.is_sat()), Some(false));
    }

    #[test]
    fn canceled_backbone_restores_state() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        configure(ctx.borrow());
        set_var_count(ctx.borrow(), 3);

        load_clause(ctx.borrow(), &lits![1, 2, 3], None);
        load_clause(ctx.borrow(), &lits![-1, -2], None);

        let mut handler = |event: SolverEvent| event != SolverEvent::BackboneCandidate;
        let outcome = compute_backbone(
            ctx.borrow(),
            &vars![1, 2, 3],
            BackboneType::PositiveAndNegative,
            &mut handler,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Canceled(SolverEvent::BackboneCandidate));
        assert_eq!(ctx.part(TrailP).current_level(), 0);
        assert!(ctx.part(AssumptionsP).lits().is_empty());
        assert_eq!(ctx.part(ClauseDbP).irred().len(), 2);
    }
}
