//! The implication graph.
use std::slice;

use cardsat_formula::{lit::LitIdx, Lit, Var};

use crate::clause::{ClauseAlloc, ClauseRef};

use super::Assignment;

/// Assignments that caused a propagation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// Unit clause, decision or assumption.
    Unit,
    Binary([Lit; 1]),
    Long(ClauseRef),
    /// Propagated by an at-most-k constraint.
    AtMost(ClauseRef),
}

impl Reason {
    /// The literals that caused the propagation, as false literals of the reason clause.
    ///
    /// For at-most-k constraints these are the negations of the currently true literals of the
    /// constraint.
    pub fn lits<'a>(&'a self, alloc: &'a ClauseAlloc, assignment: &'a Assignment) -> Antecedents<'a> {
        match self {
            Reason::Unit => Antecedents::plain(&[]),
            Reason::Binary(lit) => Antecedents::plain(lit),
            // The propagated literal is always kept at position 0
            Reason::Long(cref) => Antecedents::plain(&alloc.clause(*cref).lits()[1..]),
            Reason::AtMost(cref) => Antecedents::at_most(alloc.clause(*cref).lits(), assignment),
        }
    }

    /// True if a unit clause, decision or assumption and not a propagation.
    pub fn is_unit(&self) -> bool {
        match self {
            Reason::Unit => true,
            _ => false,
        }
    }

    /// The reason clause if it is stored in the clause arena.
    pub fn cref(&self) -> Option<ClauseRef> {
        match *self {
            Reason::Long(cref) | Reason::AtMost(cref) => Some(cref),
            _ => None,
        }
    }
}

/// Propagation that resulted in a conflict.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Conflict {
    Binary([Lit; 2]),
    Long(ClauseRef),
    AtMost(ClauseRef),
}

impl Conflict {
    /// The literals that caused the conflict, as false literals of the violated clause.
    pub fn lits<'a>(&'a self, alloc: &'a ClauseAlloc, assignment: &'a Assignment) -> Antecedents<'a> {
        match self {
            Conflict::Binary(lits) => Antecedents::plain(lits),
            Conflict::Long(cref) => Antecedents::plain(alloc.clause(*cref).lits()),
            Conflict::AtMost(cref) => Antecedents::at_most(alloc.clause(*cref).lits(), assignment),
        }
    }

    /// The conflicting clause if it is stored in the clause arena.
    pub fn cref(&self) -> Option<ClauseRef> {
        match *self {
            Conflict::Long(cref) | Conflict::AtMost(cref) => Some(cref),
            Conflict::Binary(_) => None,
        }
    }
}

/// Iterator over the false literals of a reason or conflict.
pub struct Antecedents<'a> {
    lits: slice::Iter<'a, Lit>,
    /// Present for at-most-k constraints, whose true literals are negated.
    assignment: Option<&'a Assignment>,
}

impl<'a> Antecedents<'a> {
    fn plain(lits: &'a [Lit]) -> Antecedents<'a> {
        Antecedents {
            lits: lits.iter(),
            assignment: None,
        }
    }

    fn at_most(lits: &'a [Lit], assignment: &'a Assignment) -> Antecedents<'a> {
        Antecedents {
            lits: lits.iter(),
            assignment: Some(assignment),
        }
    }
}

impl<'a> Iterator for Antecedents<'a> {
    type Item = Lit;

    fn next(&mut self) -> Option<Lit> {
        match self.assignment {
            None => self.lits.next().cloned(),
            Some(assignment) => self
                .lits
                .find(|&&lit| assignment.lit_is_true(lit))
                .map(|&lit| !lit),
        }
    }
}

/// Node and incoming edges of the implication graph.
#[derive(Copy, Clone)]
pub struct ImplNode {
    pub reason: Reason,
    pub level: LitIdx,
}

/// The implication graph.
///
/// This is a DAG having all assigned variables as nodes. It has unit clauses, assumptions and
/// decisions as sources. For each propagated assignment it has incomming edges from the literals
/// whose assignment caused the propagation to happen.
#[derive(Default)]
pub struct ImplGraph {
    /// Contains only valid data for indices of assigned variables.
    pub nodes: Vec<ImplNode>,
}

impl ImplGraph {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.nodes.resize(
            count,
            ImplNode {
                reason: Reason::Unit,
                level: 0,
            },
        );
    }

    /// Get the reason for an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn reason(&self, var: Var) -> &Reason {
        &self.nodes[var.index()].reason
    }

    /// Get the decision level of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn level(&self, var: Var) -> usize {
        self.nodes[var.index()].level as usize
    }

    /// Updates the reason for an assigned variable.
    pub fn update_reason(&mut self, var: Var, reason: Reason) {
        self.nodes[var.index()].reason = reason
    }
}
