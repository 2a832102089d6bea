//! Central solver data structure.
use partial_ref::{part, partial, PartialRef, PartialRefTarget};

use crate::analyze_conflict::AnalyzeConflict;
use crate::assumptions::Assumptions;
use crate::clause::{ClauseActivity, ClauseAlloc, ClauseDb};
use crate::config::SolverConfig;
use crate::decision::{order::SelectionOrder, vsids::Vsids};
use crate::incremental::Incremental;
use crate::model::Model;
use crate::proof::Proof;
use crate::prop::{Assignment, BinaryClauses, ImplGraph, Trail, Watchlists};
use crate::schedule::Schedule;
use crate::state::SolverState;
use crate::tmp::TmpData;
use crate::variables::Variables;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AnalyzeConflictP: AnalyzeConflict);
    part!(pub AssignmentP: Assignment);
    part!(pub AssumptionsP: Assumptions);
    part!(pub BinaryClausesP: BinaryClauses);
    part!(pub ClauseActivityP: ClauseActivity);
    part!(pub ClauseAllocP: ClauseAlloc);
    part!(pub ClauseDbP: ClauseDb);
    part!(pub ImplGraphP: ImplGraph);
    part!(pub IncrementalP: Incremental);
    part!(pub ModelP: Model);
    part!(pub ProofP: Proof);
    part!(pub ScheduleP: Schedule);
    part!(pub SelectionOrderP: SelectionOrder);
    part!(pub SolverConfigP: SolverConfig);
    part!(pub SolverStateP: SolverState);
    part!(pub TmpDataP: TmpData);
    part!(pub TrailP: Trail);
    part!(pub VariablesP: Variables);
    part!(pub VsidsP: Vsids);
    part!(pub WatchlistsP: Watchlists);
}

pub use parts::*;

/// Central solver data structure.
///
/// This struct contains all data kept by the solver. Most functions operating on multiple fields of
/// the context use partial references provided by the `partial_ref` crate. This documents the data
/// dependencies and makes the borrow checker happy without the overhead of passing individual
/// references.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part = "AnalyzeConflictP"]
    analyze_conflict: AnalyzeConflict,
    #[part = "AssignmentP"]
    assignment: Assignment,
    #[part = "AssumptionsP"]
    pub(crate) assumptions: Assumptions,
    #[part = "BinaryClausesP"]
    binary_clauses: BinaryClauses,
    #[part = "ClauseActivityP"]
    clause_activity: ClauseActivity,
    #[part = "ClauseAllocP"]
    clause_alloc: ClauseAlloc,
    #[part = "ClauseDbP"]
    clause_db: ClauseDb,
    #[part = "ImplGraphP"]
    impl_graph: ImplGraph,
    #[part = "IncrementalP"]
    incremental: Incremental,
    #[part = "ModelP"]
    model: Model,
    #[part = "ProofP"]
    pub(crate) proof: Proof,
    #[part = "ScheduleP"]
    schedule: Schedule,
    #[part = "SelectionOrderP"]
    selection_order: SelectionOrder,
    #[part = "SolverConfigP"]
    pub(crate) solver_config: SolverConfig,
    #[part = "SolverStateP"]
    solver_state: SolverState,
    #[part = "TmpDataP"]
    tmp_data: TmpData,
    #[part = "TrailP"]
    trail: Trail,
    #[part = "VariablesP"]
    pub(crate) variables: Variables,
    #[part = "VsidsP"]
    vsids: Vsids,
    #[part = "WatchlistsP"]
    watchlists: Watchlists,
}

/// Update structures for a new variable count.
///
/// When shrinking, the removed variables must be unassigned and no clause may refer to them.
pub fn set_var_count(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut BinaryClausesP,
        mut ImplGraphP,
        mut SelectionOrderP,
        mut TmpDataP,
        mut VariablesP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    count: usize,
) {
    ctx.part_mut(AnalyzeConflictP).set_var_count(count);
    ctx.part_mut(AssignmentP).set_var_count(count);
    ctx.part_mut(BinaryClausesP).set_var_count(count);
    ctx.part_mut(ImplGraphP).set_var_count(count);
    ctx.part_mut(SelectionOrderP).set_var_count(count);
    ctx.part_mut(TmpDataP).set_var_count(count);
    ctx.part_mut(VariablesP).set_var_count(count);
    ctx.part_mut(VsidsP).set_var_count(count);
    ctx.part_mut(WatchlistsP).set_var_count(count);
}

/// Apply the stored configuration to the parts that cache configured values.
pub fn configure(
    mut ctx: partial!(
        Context,
        mut ClauseActivityP,
        mut ProofP,
        mut ScheduleP,
        mut VsidsP,
        SolverConfigP,
    ),
) {
    let (config, mut ctx) = ctx.split_part(SolverConfigP);
    ctx.part_mut(ClauseActivityP).set_decay(config.clause_decay);
    ctx.part_mut(VsidsP).set_decay(config.var_decay);
    ctx.part_mut(ScheduleP).configure(config);
    ctx.part_mut(ProofP).set_enabled(config.proof_generation);
}
