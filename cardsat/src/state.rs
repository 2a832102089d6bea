//! Miscellaneous solver state.

/// Satisfiability state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
    /// The formula itself is unsatisfiable. This is permanent until a snapshot taken before is
    /// loaded.
    Unsat,
    UnsatUnderAssumptions,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Miscellaneous solver state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
#[derive(Default)]
pub struct SolverState {
    pub sat_state: SatState,
    /// Set while a public operation mutates the solver.
    ///
    /// Still being set when an operation starts means a previous one was aborted by a panic.
    pub in_progress: bool,
}

impl SolverState {
    /// Whether the formula is known to be unsatisfiable without assumptions.
    pub fn is_unsat(&self) -> bool {
        self.sat_state == SatState::Unsat
    }

    /// Forget the result of the last solve call unless the formula is unsatisfiable.
    pub fn invalidate_result(&mut self) {
        if self.sat_state != SatState::Unsat {
            self.sat_state = SatState::Unknown;
        }
    }
}
