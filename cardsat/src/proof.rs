//! Proof generation.
//!
//! When enabled, the solver records a DRUP proof in memory: every clause it adds beyond the input,
//! every clause it deletes and the final contradiction. The input clauses are kept separately,
//! together with the proposition they were added with.
//!
//! Steps can be exported as integer rows, where a leading `1` marks an added clause, `-1` a deleted
//! clause and a single `0` the empty clause. Literals use the 1-based signed numbering of DIMACS.
//! [`drat`] writes the same steps as text or binary DRAT.

use cardsat_formula::Lit;

use crate::handler::Proposition;

pub mod drat;

/// A single proof step.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ProofStep {
    /// Add a clause justified by reverse unit propagation.
    AddClause { clause: Vec<Lit> },
    /// Delete a clause consisting of the given literals.
    DeleteClause { clause: Vec<Lit> },
    /// The empty clause was derived.
    Contradiction,
}

impl ProofStep {
    /// The step as integer row.
    pub fn to_ints(&self) -> Vec<isize> {
        let (tag, clause) = match self {
            ProofStep::AddClause { clause } => (1, &clause[..]),
            ProofStep::DeleteClause { clause } => (-1, &clause[..]),
            ProofStep::Contradiction => return vec![0],
        };
        let mut row = Vec::with_capacity(clause.len() + 1);
        row.push(tag);
        row.extend(clause.iter().map(|lit| lit.to_dimacs()));
        row
    }
}

/// An input clause or assumption as recorded for the proof.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct OriginalClause {
    pub clause: Vec<Lit>,
    pub proposition: Option<Proposition>,
}

/// Proof generation.
#[derive(Default)]
pub struct Proof {
    active: bool,
    original: Vec<OriginalClause>,
    steps: Vec<ProofStep>,
}

impl Proof {
    /// Start or stop recording.
    pub fn set_enabled(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether proof generation is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Add a step to the proof.
    ///
    /// Ignored when proof generation is disabled.
    pub fn add_step(&mut self, step: ProofStep) {
        if self.active {
            self.steps.push(step);
        }
    }

    /// Record an input clause.
    ///
    /// Ignored when proof generation is disabled.
    pub fn add_original(&mut self, clause: &[Lit], proposition: Option<Proposition>) {
        if self.active {
            self.original.push(OriginalClause {
                clause: clause.to_vec(),
                proposition,
            });
        }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn original_clauses(&self) -> &[OriginalClause] {
        &self.original
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn steps_len(&self) -> usize {
        self.steps.len()
    }

    /// Drop original clauses and steps recorded after the given lengths.
    pub fn truncate(&mut self, original_len: usize, steps_len: usize) {
        self.original.truncate(original_len);
        self.steps.truncate(steps_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cardsat_formula::lits;

    #[test]
    fn integer_rows() {
        let add = ProofStep::AddClause {
            clause: lits![1, -3].to_vec(),
        };
        let delete = ProofStep::DeleteClause {
            clause: lits![-2, 4, 5].to_vec(),
        };
        assert_eq!(add.to_ints(), vec![1, 1, -3]);
        assert_eq!(delete.to_ints(), vec![-1, -2, 4, 5]);
        assert_eq!(ProofStep::Contradiction.to_ints(), vec![0]);
    }

    #[test]
    fn disabled_proof_records_nothing() {
        let mut proof = Proof::default();
        proof.add_step(ProofStep::Contradiction);
        proof.add_original(&lits![1], None);
        assert!(proof.steps().is_empty());
        assert!(proof.original_clauses().is_empty());

        proof.set_enabled(true);
        proof.add_original(&lits![1], Some(Proposition::new("a")));
        proof.add_step(ProofStep::Contradiction);
        proof.add_step(ProofStep::Contradiction);
        proof.truncate(0, 1);
        assert!(proof.original_clauses().is_empty());
        assert_eq!(proof.steps(), &[ProofStep::Contradiction]);
    }
}
