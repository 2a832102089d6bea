//! Search loop and solve calls.
use log::{debug, info};
use partial_ref::{partial, PartialRef};

use crate::assumptions::{enqueue_assumption, EnqueueAssumption};
use crate::cdcl::learn_from_conflict;
use crate::clause::reduce_learnts;
use crate::context::{parts::*, Context};
use crate::decision::make_decision;
use crate::handler::{Outcome, SolverEvent, SolverHandler};
use crate::model::store_model;
use crate::proof::ProofStep;
use crate::prop::{backtrack, full_restart, propagate};
use crate::state::SatState;

/// Result of a search round.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Round {
    /// A model was found.
    Sat,
    /// The formula or the assumptions are unsatisfiable.
    Unsat,
    /// The solver restarted and the next round continues the search.
    Restart,
    Canceled(SolverEvent),
}

/// Search until a model is found, unsatisfiability is established or a restart is due.
fn search_round(
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
        mut ProofP,
        mut ScheduleP,
        mut SelectionOrderP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        IncrementalP,
        SolverConfigP,
    ),
    handler: &mut dyn SolverHandler,
) -> Round {
    ctx.part_mut(SelectionOrderP).rewind(0);

    loop {
        if let Err(conflict) = propagate(ctx.borrow()) {
            if !handler.should_resume(SolverEvent::ConflictDetected) {
                return Round::Canceled(SolverEvent::ConflictDetected);
            }

            let (config, mut ctx) = ctx.split_part(SolverConfigP);

            if let Some(decay) = ctx.part_mut(ScheduleP).count_conflict(config) {
                ctx.part_mut(VsidsP).set_decay(decay);
            }

            if ctx.part(TrailP).current_level() == 0 {
                return Round::Unsat;
            }

            let trail_len = ctx.part(TrailP).trail().len();
            ctx.part_mut(ScheduleP).record_trail(config, trail_len);

            learn_from_conflict(ctx.borrow(), conflict);
            continue;
        }

        {
            let (config, mut ctx) = ctx.split_part(SolverConfigP);

            if ctx.part_mut(ScheduleP).restart_due(config) {
                backtrack(ctx.borrow(), 0);
                debug!("restart after {} conflicts", ctx.part(ScheduleP).conflicts());
                return Round::Restart;
            }

            let learnt_count = ctx.part(ClauseDbP).learnts().len();
            if ctx.part_mut(ScheduleP).reduce_due(learnt_count) {
                let special_increments = reduce_learnts(ctx.borrow());
                ctx.part_mut(ScheduleP).reduced(config, special_increments);
                debug!(
                    "reduced clause database from {} to {} learned clauses",
                    learnt_count,
                    ctx.part(ClauseDbP).learnts().len()
                );
            }
        }

        match enqueue_assumption(ctx.borrow()) {
            EnqueueAssumption::Enqueued => continue,
            EnqueueAssumption::Conflict => return Round::Unsat,
            EnqueueAssumption::Done => (),
        }

        if !make_decision(ctx.borrow()) {
            return Round::Sat;
        }
    }
}

/// Check the satisfiability of the current formula under the current assumptions.
///
/// On success the model or the assumption conflict are stored. Returns `Done(true)` when a model
/// was found and `Done(false)` otherwise. The solver is at decision level 0 afterwards, also when
/// the handler canceled the call.
pub fn solve(
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
    handler: &mut dyn SolverHandler,
) -> Outcome<bool> {
    ctx.part_mut(ModelP).clear();
    ctx.part_mut(AssumptionsP).clear_conflict();

    if !handler.should_resume(SolverEvent::SatCallStarted) {
        ctx.part_mut(SolverStateP).invalidate_result();
        return Outcome::Canceled(SolverEvent::SatCallStarted);
    }

    if ctx.part(SolverStateP).is_unsat() {
        return Outcome::Done(false);
    }

    info!(
        "solving {} variables, {} clauses and {} assumptions",
        ctx.part(AssignmentP).assignment().len(),
        ctx.part(ClauseDbP).irred().len(),
        ctx.part(AssumptionsP).lits().len()
    );

    let sat = loop {
        match search_round(ctx.borrow(), handler) {
            Round::Restart => (),
            Round::Sat => break true,
            Round::Unsat => break false,
            Round::Canceled(event) => {
                full_restart(ctx.borrow());
                ctx.part_mut(SolverStateP).invalidate_result();
                info!("solving canceled at {}", event);
                return Outcome::Canceled(event);
            }
        }
    };

    let assumptions_failed = !ctx.part(AssumptionsP).conflict().is_empty();

    if sat {
        store_model(ctx.borrow());
        ctx.part_mut(SolverStateP).sat_state = SatState::Sat;
    } else if assumptions_failed {
        ctx.part_mut(SolverStateP).sat_state = SatState::UnsatUnderAssumptions;
    } else {
        ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        ctx.part_mut(ProofP).add_step(ProofStep::Contradiction);
    }

    full_restart(ctx.borrow());

    info!(
        "solving finished: {} after {} conflicts",
        if sat { "satisfiable" } else { "unsatisfiable" },
        ctx.part(ScheduleP).conflicts()
    );

    if !handler.should_resume(SolverEvent::SatCallFinished) {
        return Outcome::Canceled(SolverEvent::SatCallFinished);
    }

    Outcome::Done(sat)
}
