//! Cooperative cancellation of long running operations.
//!
//! The solver never stops on its own. At well defined points it reports a [`SolverEvent`] to a
//! [`SolverHandler`] and asks whether to resume. Time or step limits are implemented by handlers
//! that answer `false` once their budget is used up.
use std::fmt;

/// Points at which the solver consults its handler.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolverEvent {
    /// A solve call is about to start searching.
    SatCallStarted,
    /// A solve call finished with a definite answer.
    SatCallFinished,
    /// The search ran into a conflict.
    ConflictDetected,
    /// A backbone computation is about to start.
    BackboneStarted,
    /// A backbone candidate is about to be checked.
    BackboneCandidate,
}

impl fmt::Display for SolverEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SolverEvent::SatCallStarted => "SAT call started",
            SolverEvent::SatCallFinished => "SAT call finished",
            SolverEvent::ConflictDetected => "conflict detected",
            SolverEvent::BackboneStarted => "backbone computation started",
            SolverEvent::BackboneCandidate => "backbone candidate",
        };
        f.write_str(name)
    }
}

/// Receives solver events and decides whether the current operation continues.
pub trait SolverHandler {
    /// Returning `false` cancels the running operation.
    ///
    /// The solver is backtracked to decision level 0 before the cancellation is reported, so it
    /// stays usable.
    fn should_resume(&mut self, event: SolverEvent) -> bool;
}

impl<F: FnMut(SolverEvent) -> bool> SolverHandler for F {
    fn should_resume(&mut self, event: SolverEvent) -> bool {
        self(event)
    }
}

/// Handler that never cancels.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoHandler;

impl SolverHandler for NoHandler {
    fn should_resume(&mut self, _event: SolverEvent) -> bool {
        true
    }
}

/// Cancels after a fixed number of conflicts.
#[derive(Clone, Debug)]
pub struct ConflictLimit {
    remaining: u64,
}

impl ConflictLimit {
    pub fn new(conflicts: u64) -> ConflictLimit {
        ConflictLimit {
            remaining: conflicts,
        }
    }
}

impl SolverHandler for ConflictLimit {
    fn should_resume(&mut self, event: SolverEvent) -> bool {
        if event != SolverEvent::ConflictDetected {
            return true;
        }
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Result of an operation that can be canceled by a [`SolverHandler`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Done(T),
    /// The handler stopped the operation at the given event.
    Canceled(SolverEvent),
}

impl<T> Outcome<T> {
    /// The result, or `None` if canceled.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Canceled(_) => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Canceled(event) => Outcome::Canceled(event),
        }
    }
}

/// Caller supplied justification attached to a clause or an assumption.
///
/// The solver only stores and returns propositions, they have no influence on the search.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Proposition(String);

impl Proposition {
    pub fn new(text: impl Into<String>) -> Proposition {
        Proposition(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_limit_counts_conflicts_only() {
        let mut limit = ConflictLimit::new(2);
        assert!(limit.should_resume(SolverEvent::SatCallStarted));
        assert!(limit.should_resume(SolverEvent::ConflictDetected));
        assert!(limit.should_resume(SolverEvent::BackboneCandidate));
        assert!(limit.should_resume(SolverEvent::ConflictDetected));
        assert!(!limit.should_resume(SolverEvent::ConflictDetected));
    }

    #[test]
    fn closures_are_handlers() {
        let mut seen = vec![];
        {
            let mut handler = |event: SolverEvent| {
                seen.push(event);
                event != SolverEvent::SatCallFinished
            };
            assert!(handler.should_resume(SolverEvent::SatCallStarted));
            assert!(!handler.should_resume(SolverEvent::SatCallFinished));
        }
        assert_eq!(
            seen,
            vec![SolverEvent::SatCallStarted, SolverEvent::SatCallFinished]
        );
    }

    #[test]
    fn outcome_accessors() {
        assert_eq!(Outcome::Done(3).map(|x| x * 2).done(), Some(6));
        let canceled: Outcome<u32> = Outcome::Canceled(SolverEvent::ConflictDetected);
        assert!(canceled.is_canceled());
        assert_eq!(canceled.done(), None);
    }
}
