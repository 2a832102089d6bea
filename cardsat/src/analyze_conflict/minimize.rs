//! Learned clause minimization.
//!
//! A literal of the learned clause is redundant when its negation is implied by the other literals
//! of the clause together with unit clauses. Basic minimization only checks the direct reason of
//! each literal, deep minimization follows reasons recursively.
//!
//! Recursive checks are cut short using abstract levels: a set of decision levels hashed into the
//! bits of a word. A literal assigned at a level not present in the clause can never be implied by
//! the clause's literals.
use cardsat_formula::{Lit, Var};

use crate::clause::ClauseAlloc;
use crate::config::ClauseMinimization;
use crate::prop::{Assignment, BinaryClauses, ImplGraph};

use super::AnalyzeConflict;

fn abstract_level(level: usize) -> u32 {
    1 << (level & 31)
}

/// Remove redundant literals from the learned clause.
///
/// Expects the flags of all clause literals except the asserting one to be set. Flags set while
/// checking redundancy are recorded for cleanup.
pub fn minimize_clause(
    analyze: &mut AnalyzeConflict,
    alloc: &ClauseAlloc,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    mode: ClauseMinimization,
) {
    let AnalyzeConflict {
        clause,
        var_flags,
        to_clean,
        stack,
        ..
    } = analyze;

    let abstract_levels = clause[1..]
        .iter()
        .fold(0, |acc, lit| acc | abstract_level(impl_graph.level(lit.var())));

    let mut kept = 1;

    for i in 1..clause.len() {
        let lit = clause[i];
        let reason = impl_graph.reason(lit.var());

        let redundant = !reason.is_unit()
            && match mode {
                ClauseMinimization::None => false,
                ClauseMinimization::Basic => reason.lits(alloc, assignment).all(|antecedent| {
                    var_flags[antecedent.index()] || impl_graph.level(antecedent.var()) == 0
                }),
                ClauseMinimization::Deep => is_redundant(
                    var_flags,
                    to_clean,
                    stack,
                    alloc,
                    assignment,
                    impl_graph,
                    lit,
                    abstract_levels,
                ),
            };

        if !redundant {
            clause[kept] = lit;
            kept += 1;
        }
    }

    clause.truncate(kept);
}

/// Check whether a literal is implied by flagged literals and unit clauses.
///
/// On success the flags of all traversed literals stay set, so later checks can reuse them.
#[allow(clippy::too_many_arguments)]
fn is_redundant(
    var_flags: &mut [bool],
    to_clean: &mut Vec<Var>,
    stack: &mut Vec<Lit>,
    alloc: &ClauseAlloc,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    lit: Lit,
    abstract_levels: u32,
) -> bool {
    stack.clear();
    stack.push(lit);
    let top = to_clean.len();

    while let Some(lit) = stack.pop() {
        for antecedent in impl_graph.reason(lit.var()).lits(alloc, assignment) {
            let level = impl_graph.level(antecedent.var());
            if var_flags[antecedent.index()] || level == 0 {
                continue;
            }
            if !impl_graph.reason(antecedent.var()).is_unit()
                && abstract_level(level) & abstract_levels != 0
            {
                var_flags[antecedent.index()] = true;
                stack.push(antecedent);
                to_clean.push(antecedent.var());
            } else {
                for var in to_clean.drain(top..) {
                    var_flags[var.index()] = false;
                }
                return false;
            }
        }
    }

    true
}

/// Remove literals that can be resolved away using binary clauses of the asserting literal.
///
/// `flags` are indexed by literal code and have to be all false. They are all false again after
/// returning.
pub fn minimize_with_binary_clauses(
    clause: &mut Vec<Lit>,
    flags: &mut [bool],
    binary_clauses: &BinaryClauses,
    assignment: &Assignment,
) {
    let asserted = !clause[0];

    for &lit in clause[1..].iter() {
        flags[lit.code()] = true;
    }

    for implied in binary_clauses.implied(asserted) {
        if assignment.lit_is_true(implied) {
            flags[(!implied).code()] = false;
        }
    }

    let mut kept = 1;
    for i in 1..clause.len() {
        let lit = clause[i];
        if flags[lit.code()] {
            flags[lit.code()] = false;
            clause[kept] = lit;
            kept += 1;
        }
    }
    clause.truncate(kept);
}
