//! Cardsat is a [CDCL][cdcl] based SAT solver with native support for at-most-k constraints.
//!
//! Given a set of clauses and cardinality constraints over boolean variables, it either finds a
//! variable assignment satisfying all of them or establishes that none exists. The solver is
//! incremental: clauses can be added between solve calls, solving can be restricted by
//! assumptions, and the solver state can be saved and rolled back.
//!
//! On top of the core search the solver computes backbones, i.e. the literals that hold in every
//! model of the formula.
//!
//! [cdcl]: https://en.wikipedia.org/wiki/Conflict-Driven_Clause_Learning

pub mod backbone;
pub mod config;
pub mod handler;
pub mod incremental;
pub mod proof;
pub mod solver;

mod analyze_conflict;
mod assumptions;
mod cdcl;
mod clause;
mod context;
mod decision;
mod glue;
mod load;
mod model;
mod prop;
mod schedule;
mod search;
mod state;
mod tmp;
mod variables;

pub use cardsat_formula::{Lit, Var};

pub use backbone::{Backbone, BackboneType};
pub use config::{ClauseMinimization, SolverConfig};
pub use handler::{Outcome, Proposition, SolverEvent, SolverHandler};
pub use incremental::Snapshot;
pub use solver::{Solver, SolverError};
