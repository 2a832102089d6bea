//! Partial assignment and backtracking.
use partial_ref::{partial, PartialRef};

use cardsat_formula::{lit::LitIdx, Lit, Var};

use crate::context::{parts::*, Context};

use super::Reason;

/// Current partial assignment.
pub struct Assignment {
    assignment: Vec<Option<bool>>,
    /// Value of each variable when it was last assigned, or its initial phase.
    last_value: Vec<bool>,
    /// Whether backtracking stores the undone values as phases.
    save_phases: bool,
}

impl Default for Assignment {
    fn default() -> Assignment {
        Assignment {
            assignment: vec![],
            last_value: vec![],
            save_phases: true,
        }
    }
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
        self.last_value.resize(count, true);
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Value last assigned to a variable.
    ///
    /// If the variable is currently assigned this returns the previously assigned value. If the
    /// variable was never assigned this returns its initial phase.
    pub fn last_var_value(&self, var: Var) -> bool {
        self.last_value[var.index()]
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unk(&self, lit: Lit) -> bool {
        self.assignment[lit.index()].is_none()
    }

    pub fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = lit.is_positive().into()
    }

    pub fn unassign_var(&mut self, var: Var) {
        let value = &mut self.assignment[var.index()];
        if let Some(value) = value.take() {
            self.last_value[var.index()] = !self.save_phases || value;
        }
    }

    /// Set the phase used for the next decision on a variable.
    pub fn set_phase(&mut self, var: Var, phase: bool) {
        self.last_value[var.index()] = phase;
    }

    /// Enable or disable phase saving.
    ///
    /// With phase saving disabled, unassigned variables get a positive phase.
    pub fn set_save_phases(&mut self, save_phases: bool) {
        self.save_phases = save_phases;
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    /// Stack of all propagated and all enqueued assignments
    trail: Vec<Lit>,
    /// Next assignment in trail to propagate
    queue_head_pos: usize,
    /// Decision levels as trail indices.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// Return the next assigned literal to propagate.
    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).cloned()
    }

    pub fn pop_queue(&mut self) {
        self.queue_head_pos += 1;
        debug_assert!(self.queue_head_pos <= self.trail.len());
    }

    /// Skip propagation of all enqueued assignments.
    ///
    /// Used after a conflict, which is always followed by backtracking.
    pub fn fast_forward_queue(&mut self) {
        self.queue_head_pos = self.trail.len();
    }

    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// Start a new decision level.
    ///
    /// Does not enqueue the decision itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx)
    }

    /// Current decision level.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    /// Trail position of the first assignment of a decision level.
    ///
    /// The level must be between 1 and the current level.
    pub fn level_start(&self, level: usize) -> usize {
        self.decisions[level - 1] as usize
    }
}

/// Enqueues the assignment of true to a literal.
///
/// This updates the assignment and trail, but does not perform any propagation. The literal has to
/// be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP),
    lit: Lit,
    reason: Reason,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    trail.trail.push(lit);

    let node = &mut ctx.part_mut(ImplGraphP).nodes[lit.index()];
    node.reason = reason;
    node.level = trail.decisions.len() as LitIdx;
}

/// Undo all assignments in decision levels deeper than the given level.
///
/// Unassigned variables are made available for decisions again.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP),
    level: usize,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);
    let vsids = ctx.part_mut(VsidsP);

    if level >= trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head_pos = new_trail_len;
    trail.decisions.truncate(level);

    for &lit in trail.trail[new_trail_len..].iter().rev() {
        assignment.unassign_var(lit.var());
        vsids.make_available(lit.var());
    }
    trail.trail.truncate(new_trail_len);
}

/// Undo all decisions.
pub fn full_restart(mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP)) {
    backtrack(ctx.borrow(), 0);
}

/// Undo all assignments, including those of level 0.
///
/// Afterwards the level 0 assignments have to be recreated by enqueuing and propagating the unit
/// clauses.
pub fn complete_backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP, mut VsidsP),
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);
    let (impl_graph, mut ctx) = ctx.split_part_mut(ImplGraphP);
    let vsids = ctx.part_mut(VsidsP);

    for &lit in trail.trail.iter().rev() {
        assignment.unassign_var(lit.var());
        impl_graph.nodes[lit.index()].reason = Reason::Unit;
        vsids.make_available(lit.var());
    }

    trail.trail.clear();
    trail.decisions.clear();
    trail.queue_head_pos = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use cardsat_formula::{lit, lits, var, vars};

    use crate::context::set_var_count;

    #[test]
    fn backtrack_saves_phases_and_restores_heap() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 4);

        while ctx.part_mut(VsidsP).next().is_some() {}

        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::Unit);
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(3), Reason::Binary([lit!(2)]));
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(-4), Reason::Unit);

        backtrack(ctx.borrow(), 1);

        assert_eq!(ctx.part(TrailP).trail(), &lits![-1, -2, 3][..]);
        assert_eq!(ctx.part(TrailP).current_level(), 1);
        assert!(ctx.part(AssignmentP).lit_is_unk(lit!(4)));
        assert!(!ctx.part(AssignmentP).last_var_value(var!(4)));

        full_restart(ctx.borrow());

        assert_eq!(ctx.part(TrailP).trail(), &lits![-1][..]);
        assert!(!ctx.part(AssignmentP).last_var_value(var!(2)));
        assert!(ctx.part(AssignmentP).last_var_value(var!(3)));

        let mut available: Vec<_> = std::iter::from_fn(|| ctx.part_mut(VsidsP).next()).collect();
        available.sort();
        assert_eq!(available, vars![2, 3, 4]);
    }

    #[test]
    fn complete_backtrack_without_phase_saving() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 2);

        ctx.part_mut(AssignmentP).set_save_phases(false);
        enqueue_assignment(ctx.borrow(), lit!(-1), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::Binary([lit!(1)]));

        complete_backtrack(ctx.borrow());

        assert!(ctx.part(TrailP).trail().is_empty());
        assert!(ctx.part(AssignmentP).last_var_value(var!(1)));
        assert_eq!(*ctx.part(ImplGraphP).reason(var!(2)), Reason::Unit);
    }
}
