//! Clause storage.
use cardsat_formula::Lit;

pub mod activity;
pub mod alloc;
pub mod assess;
pub mod db;
pub mod header;
pub mod reduce;

pub use activity::{bump_clause_activity, decay_clause_activities, ClauseActivity};
pub use alloc::{ClauseAlloc, ClauseRef};
pub use assess::{bump_clause, learned_clause_header};
pub use db::ClauseDb;
pub use header::{ClauseHeader, ClauseKind};
pub use reduce::reduce_learnts;

/// A clause or at-most-k constraint stored in a [`ClauseAlloc`].
#[derive(Clone, Debug)]
pub struct Clause {
    header: ClauseHeader,
    lits: Vec<Lit>,
}

impl Clause {
    /// The clause's header
    pub fn header(&self) -> &ClauseHeader {
        &self.header
    }

    /// Mutable reference to the clause's header
    pub fn header_mut(&mut self) -> &mut ClauseHeader {
        &mut self.header
    }

    /// The clause's literals
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    /// Mutable slice of the clause's literals
    ///
    /// The literals can be permuted but the length is fixed.
    pub fn lits_mut(&mut self) -> &mut [Lit] {
        &mut self.lits
    }
}
