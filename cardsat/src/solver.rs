//! Boolean satisfiability solver.
use std::io;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};
use thiserror::Error;

use cardsat_formula::{Lit, Var};

use crate::backbone::{compute_backbone, Backbone, BackboneType};
use crate::config::{ConfigError, SolverConfig};
use crate::context::{configure, parts::*, set_var_count, Context};
use crate::handler::{Outcome, Proposition, SolverHandler};
use crate::incremental::{load_state, save_state, Snapshot};
use crate::load::{load_at_most, load_clause};
use crate::proof::{drat, OriginalClause, ProofStep};
use crate::search::solve;
use crate::state::SatState;

/// Possible errors while using the solver.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("solver state {id} is no longer valid")]
    StaleState { id: usize },
    #[error("the solver was left in an inconsistent state by an aborted operation")]
    InconsistentState,
    #[error("variable {var} is not known to the solver")]
    UnknownVariable { var: Var },
    #[error("literal {lit} occurs more than once in an at-most-k constraint")]
    DuplicateInCardinality { lit: Lit },
    #[error("at-most-k constraints cannot be added while proof generation is enabled")]
    AtMostWithProof,
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// A boolean satisfiability solver with support for at-most-k constraints.
pub struct Solver {
    ctx: Box<Context>,
}

impl Default for Solver {
    fn default() -> Solver {
        Solver::new()
    }
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Solver {
        let mut ctx = Box::new(Context::default());
        {
            let mut ctx = ctx.into_partial_ref_mut();
            configure(ctx.borrow());
        }
        Solver { ctx }
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Result<Solver, SolverError> {
        config.validate()?;
        let mut ctx = Box::new(Context::default());
        {
            let mut ctx = ctx.into_partial_ref_mut();
            *ctx.part_mut(SolverConfigP) = config;
            configure(ctx.borrow());
        }
        Ok(Solver { ctx })
    }

    /// The configuration used by this solver.
    pub fn config(&self) -> &SolverConfig {
        &self.ctx.solver_config
    }

    /// Number of variables known to the solver.
    pub fn var_count(&self) -> usize {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(AssignmentP).assignment().len()
    }

    /// Create a new anonymous variable.
    ///
    /// The polarity is used for the first decision on the variable. Variables that are not eligible
    /// are never used as decision and only get values by propagation.
    pub fn new_var(&mut self, polarity: bool, eligible: bool) -> Var {
        let mut ctx = self.ctx.into_partial_ref_mut();
        let var = Var::from_index(ctx.part(AssignmentP).assignment().len());
        set_var_count(ctx.borrow(), var.index() + 1);
        ctx.part_mut(AssignmentP).set_phase(var, polarity);
        if !eligible {
            ctx.part_mut(VsidsP).set_eligible(var, false);
        }
        var
    }

    /// The variable with the given name, created on first use.
    ///
    /// Named variables are eligible for decisions and start with the configured initial phase.
    pub fn var_by_name(&mut self, name: &str) -> Var {
        if let Some(var) = self.lookup_var(name) {
            return var;
        }
        let initial_phase = self.config().initial_phase;
        let var = self.new_var(initial_phase, true);
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(VariablesP).set_name(var, name);
        var
    }

    /// The variable with the given name, if it exists.
    pub fn lookup_var(&self, name: &str) -> Option<Var> {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(VariablesP).var_by_name(name)
    }

    /// The name of a variable created by [`var_by_name`](Solver::var_by_name).
    pub fn var_name(&self, var: Var) -> Option<&str> {
        self.ctx.variables.name(var)
    }

    /// Add a clause.
    ///
    /// Returns `Ok(false)` if the formula is known to be unsatisfiable now. This stays so until a
    /// snapshot taken before is loaded.
    pub fn add_clause(
        &mut self,
        lits: &[Lit],
        proposition: Option<Proposition>,
    ) -> Result<bool, SolverError> {
        self.check_lits(lits)?;
        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            Ok(load_clause(ctx.borrow(), lits, proposition))
        })
    }

    /// Add a constraint requiring at most `k` of the given literals to be true.
    ///
    /// Returns `Ok(false)` if the formula is known to be unsatisfiable now.
    pub fn add_at_most(&mut self, lits: &[Lit], k: usize) -> Result<bool, SolverError> {
        self.check_lits(lits)?;
        if self.ctx.proof.is_active() {
            return Err(SolverError::AtMostWithProof);
        }
        let mut sorted = lits.to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SolverError::DuplicateInCardinality { lit: pair[0] });
        }
        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            Ok(load_at_most(ctx.borrow(), lits, k))
        })
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self, handler: &mut impl SolverHandler) -> Result<Outcome<bool>, SolverError> {
        self.solve_with_propositions(handler, &[])
    }

    /// Check the satisfiability of the current formula with the given literals assumed true.
    ///
    /// When the result is unsatisfiable because of the assumptions, [`conflict`](Solver::conflict)
    /// returns the responsible assumptions as negated clause.
    pub fn solve_with_assumptions(
        &mut self,
        handler: &mut impl SolverHandler,
        assumptions: &[Lit],
    ) -> Result<Outcome<bool>, SolverError> {
        let tagged: Vec<_> = assumptions.iter().map(|&lit| (lit, None)).collect();
        self.solve_with_propositions(handler, &tagged)
    }

    /// Like [`solve_with_assumptions`](Solver::solve_with_assumptions) with a proposition attached
    /// to each assumption.
    ///
    /// The propositions of failed assumptions are available through
    /// [`failed_propositions`](Solver::failed_propositions).
    pub fn solve_with_propositions(
        &mut self,
        handler: &mut impl SolverHandler,
        assumptions: &[(Lit, Option<Proposition>)],
    ) -> Result<Outcome<bool>, SolverError> {
        let lits: Vec<_> = assumptions.iter().map(|(lit, _)| *lit).collect();
        self.check_lits(&lits)?;
        let propositions = assumptions
            .iter()
            .map(|(_, proposition)| proposition.clone())
            .collect();

        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            ctx.part_mut(AssumptionsP).set(lits, propositions);
            let outcome = solve(ctx.borrow(), handler);
            ctx.part_mut(AssumptionsP).clear();
            Ok(outcome)
        })
    }

    /// Satisfying assignment found by the last solve call, as literals of all variables.
    pub fn model(&self) -> Option<Vec<Lit>> {
        if self.sat_state() != SatState::Sat {
            return None;
        }
        let ctx = self.ctx.into_partial_ref();
        Some(
            ctx.part(ModelP)
                .assignment()
                .iter()
                .enumerate()
                .map(|(index, &value)| Var::from_index(index).lit(value))
                .collect(),
        )
    }

    /// Value of a variable in the last model.
    pub fn value(&self, var: Var) -> Option<bool> {
        if self.sat_state() != SatState::Sat {
            return None;
        }
        let ctx = self.ctx.into_partial_ref();
        ctx.part(ModelP).assignment().get(var.index()).cloned()
    }

    /// Clause of negated assumptions that are unsatisfiable together with the formula.
    ///
    /// Only present when the last solve call failed because of its assumptions.
    pub fn conflict(&self) -> Option<&[Lit]> {
        if self.sat_state() != SatState::UnsatUnderAssumptions {
            return None;
        }
        Some(self.ctx.assumptions.conflict())
    }

    /// The assumptions responsible for the last unsatisfiable result.
    pub fn failed_assumptions(&self) -> Option<Vec<Lit>> {
        if self.sat_state() != SatState::UnsatUnderAssumptions {
            return None;
        }
        let ctx = self.ctx.into_partial_ref();
        Some(ctx.part(AssumptionsP).failed_assumptions().collect())
    }

    /// Propositions attached to the failed assumptions.
    pub fn failed_propositions(&self) -> Vec<&Proposition> {
        if self.sat_state() != SatState::UnsatUnderAssumptions {
            return vec![];
        }
        self.ctx.assumptions.failed_propositions()
    }

    /// Whether the formula without assumptions is known to be unsatisfiable.
    pub fn is_unsat(&self) -> bool {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(SolverStateP).is_unsat()
    }

    /// Save the current state, so it can be restored with [`load_state`](Solver::load_state).
    pub fn save_state(&mut self) -> Result<Snapshot, SolverError> {
        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            Ok(save_state(ctx.borrow()))
        })
    }

    /// Restore a saved state.
    ///
    /// All variables, clauses and constraints added since are removed. Snapshots taken after the
    /// given one can no longer be loaded.
    pub fn load_state(&mut self, snapshot: &Snapshot) -> Result<(), SolverError> {
        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            load_state(ctx.borrow(), snapshot)
        })
    }

    /// Compute the backbone of the formula restricted to the given variables.
    pub fn compute_backbone(
        &mut self,
        variables: &[Var],
        backbone_type: BackboneType,
        handler: &mut impl SolverHandler,
    ) -> Result<Outcome<Backbone>, SolverError> {
        self.guarded(|ctx| {
            let mut ctx = ctx.into_partial_ref_mut();
            compute_backbone(ctx.borrow(), variables, backbone_type, handler)
        })
    }

    /// Decide on the given literals first, in order.
    ///
    /// Once all of them are assigned, decisions fall back to the activity heuristic. An empty
    /// order removes a previously set one.
    pub fn set_selection_order(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.check_lits(lits)?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SelectionOrderP).set(lits.to_vec());
        Ok(())
    }

    /// Steps of the recorded proof.
    pub fn proof_steps(&self) -> &[ProofStep] {
        self.ctx.proof.steps()
    }

    /// Input clauses and failed assumptions recorded for the proof.
    pub fn proof_original_clauses(&self) -> &[OriginalClause] {
        self.ctx.proof.original_clauses()
    }

    /// Write the recorded proof in DRAT format.
    pub fn write_drat(&self, target: &mut impl io::Write, binary: bool) -> io::Result<()> {
        drat::write_proof(target, self.proof_steps(), binary)
    }

    fn sat_state(&self) -> SatState {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(SolverStateP).sat_state
    }

    /// Check that all literals refer to known variables.
    fn check_lits(&self, lits: &[Lit]) -> Result<(), SolverError> {
        let var_count = self.var_count();
        match lits.iter().find(|lit| lit.index() >= var_count) {
            Some(lit) => Err(SolverError::UnknownVariable { var: lit.var() }),
            None => Ok(()),
        }
    }

    /// Run an operation that modifies the solver.
    ///
    /// A panic during the operation leaves the in progress flag set, so later operations fail.
    fn guarded<T>(
        &mut self,
        operation: impl FnOnce(&mut Context) -> Result<T, SolverError>,
    ) -> Result<T, SolverError> {
        {
            let mut ctx = self.ctx.into_partial_ref_mut();
            let state = ctx.part_mut(SolverStateP);
            if state.in_progress {
                return Err(SolverError::InconsistentState);
            }
            state.in_progress = true;
        }

        let result = operation(&mut self.ctx);

        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).in_progress = false;

        result
    }
}
