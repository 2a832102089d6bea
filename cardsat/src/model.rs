//! Satisfying assignment of the last successful solve call.
use partial_ref::{partial, PartialRef};

use cardsat_formula::{Lit, Var};

use crate::context::{parts::*, Context};

/// Satisfying assignment of the last successful solve call.
///
/// A copy of the full assignment is taken before the solver backtracks, so the model stays
/// available until the formula or the assumptions change.
#[derive(Default)]
pub struct Model {
    assignment: Vec<bool>,
}

impl Model {
    /// Value of each variable in the model.
    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }

    pub fn var_value(&self, var: Var) -> bool {
        self.assignment[var.index()]
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == lit.is_positive()
    }

    pub fn clear(&mut self) {
        self.assignment.clear();
    }
}

/// Copy the current full assignment into the model.
///
/// Variables that are still unassigned, because they are not eligible for decisions and were
/// never propagated, are stored as false.
pub fn store_model(mut ctx: partial!(Context, mut ModelP, AssignmentP)) {
    let (model, ctx) = ctx.split_part_mut(ModelP);
    model.assignment.clear();
    model.assignment.extend(
        ctx.part(AssignmentP)
            .assignment()
            .iter()
            .map(|value| value.unwrap_or(false)),
    );
}
