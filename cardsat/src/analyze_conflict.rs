//! Learns a new clause by analyzing a conflict.
use std::mem::swap;

use partial_ref::{partial, PartialRef};

use cardsat_formula::{Lit, Var};

use crate::clause::{ClauseAlloc, ClauseRef};
use crate::context::{parts::*, Context};
use crate::decision::vsids::Vsids;
use crate::glue::compute_glue;
use crate::prop::{Assignment, Conflict, ImplGraph, Reason, Trail};

mod minimize;

/// Temporaries for conflict analysis
#[derive(Default)]
pub struct AnalyzeConflict {
    /// This is the learned clause after analysis finishes.
    clause: Vec<Lit>,
    /// Number of literals in the current clause at the current level.
    current_level_count: usize,
    /// Variables in the current clause.
    var_flags: Vec<bool>,
    /// Entries to clean in `var_flags`.
    to_clean: Vec<Var>,
    /// Learned clauses that took part in the resolution.
    involved: Vec<ClauseRef>,
    /// Current level variables propagated by long or binary clauses.
    learnt_reasons: Vec<Var>,
    /// Work stack for clause minimization.
    stack: Vec<Lit>,
    /// Glue level of the learned clause.
    glue: usize,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_flags.resize(count, false);
    }

    /// The learned clause.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }

    /// Learned clauses involved in the last conflict.
    pub fn involved(&self) -> &[ClauseRef] {
        &self.involved
    }

    /// Glue level of the learned clause.
    pub fn glue(&self) -> usize {
        self.glue
    }

    /// Add a literal to the current clause.
    fn add_literal(
        &mut self,
        vsids: &mut Vsids,
        impl_graph: &ImplGraph,
        current_level: usize,
        lit: Lit,
    ) {
        let lit_level = impl_graph.level(lit.var());
        // No need to add literals that are set by unit clauses or already present
        if lit_level > 0 && !self.var_flags[lit.index()] {
            vsids.bump(lit.var());
            self.var_flags[lit.index()] = true;
            if lit_level == current_level {
                self.current_level_count += 1;
                match impl_graph.reason(lit.var()) {
                    Reason::Long(_) | Reason::Binary(_) => self.learnt_reasons.push(lit.var()),
                    _ => (),
                }
            } else {
                self.clause.push(lit);
                self.to_clean.push(lit.var());
            }
        }
    }

    /// Remember a clause used during resolution if it is a learned clause.
    fn add_involved(&mut self, alloc: &ClauseAlloc, cref: Option<ClauseRef>) {
        if let Some(cref) = cref {
            if alloc.header(cref).learnt() {
                self.involved.push(cref);
            }
        }
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// The learned clause has the asserting literal at position 0 and a literal of the highest
/// remaining decision level at position 1. It is minimized according to the configuration and its
/// glue level is computed before returning.
///
/// Returns the lowest decision level that makes the learned clause asserting.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut TmpDataP,
        mut VsidsP,
        AssignmentP,
        BinaryClausesP,
        ClauseAllocP,
        ImplGraphP,
        SolverConfigP,
        TrailP,
    ),
    conflict: Conflict,
) -> usize {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);

    analyze.clause.clear();
    analyze.involved.clear();
    analyze.learnt_reasons.clear();
    analyze.current_level_count = 0;
    analyze.glue = 0;

    if ctx.part(TrailP).current_level() == 0 {
        // Conflict with no decisions, generate empty clause
        return 0;
    }

    {
        let (vsids, ctx) = ctx.split_part_mut(VsidsP);
        resolve_to_uip(
            analyze,
            vsids,
            ctx.part(ClauseAllocP),
            ctx.part(AssignmentP),
            ctx.part(ImplGraphP),
            ctx.part(TrailP),
            conflict,
        );
    }

    minimize::minimize_clause(
        analyze,
        ctx.part(ClauseAllocP),
        ctx.part(AssignmentP),
        ctx.part(ImplGraphP),
        ctx.part(SolverConfigP).clause_minimization,
    );

    let config = ctx.part(SolverConfigP);
    let max_size = config.lb_size_minimizing_clause;
    let max_glue = config.lb_lbd_minimizing_clause;
    if analyze.clause.len() <= max_size && compute_glue(ctx.borrow(), &analyze.clause) <= max_glue {
        let (tmp_data, ctx) = ctx.split_part_mut(TmpDataP);
        minimize::minimize_with_binary_clauses(
            &mut analyze.clause,
            &mut tmp_data.flags,
            ctx.part(BinaryClausesP),
            ctx.part(AssignmentP),
        );
    }

    for var in analyze.to_clean.drain(..) {
        analyze.var_flags[var.index()] = false;
    }

    // We find the highest level literal besides the asserted literal and move it into position 1.
    // This is important to ensure the watchlist constraints are not violated on backtracking.
    let mut backtrack_to = 0;

    if analyze.clause.len() > 1 {
        let impl_graph = ctx.part(ImplGraphP);
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let lit_1 = &mut prefix[1];
        backtrack_to = impl_graph.level(lit_1.var());
        for lit in rest.iter_mut() {
            let lit_level = impl_graph.level(lit.var());
            if lit_level > backtrack_to {
                backtrack_to = lit_level;
                swap(lit_1, lit);
            }
        }
    }

    analyze.glue = compute_glue(ctx.borrow(), &analyze.clause);

    // Variables propagated by clauses of lower glue than the new clause get an extra bump.
    let (vsids, ctx) = ctx.split_part_mut(VsidsP);
    let alloc = ctx.part(ClauseAllocP);
    for &var in analyze.learnt_reasons.iter() {
        let cref = match ctx.part(ImplGraphP).reason(var) {
            Reason::Long(cref) => Some(*cref),
            Reason::Binary([antecedent]) => {
                let implied = var.lit(ctx.part(AssignmentP).var_value(var) == Some(true));
                ctx.part(BinaryClausesP).clause_ref(implied, *antecedent)
            }
            _ => None,
        };
        if let Some(cref) = cref {
            if alloc.header(cref).learnt() && alloc.header(cref).glue() < analyze.glue {
                vsids.bump(var);
            }
        }
    }

    backtrack_to
}

/// Resolve the conflict clause with reasons until a single literal of the current level is left.
fn resolve_to_uip(
    analyze: &mut AnalyzeConflict,
    vsids: &mut Vsids,
    alloc: &ClauseAlloc,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    trail: &Trail,
    conflict: Conflict,
) {
    let current_level = trail.current_level();

    // We start with all the literals of the conflicted clause
    analyze.add_involved(alloc, conflict.cref());
    for lit in conflict.lits(alloc, assignment) {
        analyze.add_literal(vsids, impl_graph, current_level, lit);
    }

    // To get rid of all but one literal of the current level, we resolve the clause with the reason
    // for those literals. The correct order for this is reverse chronological.

    for &lit in trail.trail().iter().rev() {
        let lit_present = &mut analyze.var_flags[lit.index()];
        // Is the lit present in the current clause?
        if *lit_present {
            *lit_present = false;
            analyze.current_level_count -= 1;
            if analyze.current_level_count == 0 {
                // lit is the last literal of the current level present in the current clause,
                // therefore the resulting clause will assert !lit so we put in position 0
                analyze.clause.push(!lit);
                let end = analyze.clause.len() - 1;
                analyze.clause.swap(0, end);

                break;
            } else {
                // We removed the literal and now add its reason.
                let reason = impl_graph.reason(lit.var());

                analyze.add_involved(alloc, reason.cref());
                for lit in reason.lits(alloc, assignment) {
                    analyze.add_literal(vsids, impl_graph, current_level, lit);
                }
            }
        }
    }
}
