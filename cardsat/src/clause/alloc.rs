//! Clause allocator.
use cardsat_formula::Lit;

use super::{Clause, ClauseHeader};

/// Integer type used to index [`ClauseAlloc`]'s slots.
type ClauseIndex = u32;

/// Arena for clause storage.
///
/// Each clause occupies one slot of the arena. External references ([`ClauseRef`]) store the slot
/// index and stay valid until the clause is freed. Freed slots are reused by later allocations,
/// so references to freed clauses must be dropped together with the clause.
#[derive(Default)]
pub struct ClauseAlloc {
    slots: Vec<Clause>,
    free: Vec<ClauseRef>,
}

impl ClauseAlloc {
    /// Create an emtpy clause allocator.
    pub fn new() -> ClauseAlloc {
        ClauseAlloc::default()
    }

    /// Allocate space for and add a new clause.
    ///
    /// Clauses have a minimal size of 2, as unit clauses are stored on the trail.
    pub fn add_clause(&mut self, header: ClauseHeader, lits: &[Lit]) -> ClauseRef {
        assert!(
            lits.len() >= 2,
            "ClauseAlloc can only store binary and larger clauses"
        );

        let clause = Clause {
            header,
            lits: lits.to_vec(),
        };

        if let Some(cref) = self.free.pop() {
            self.slots[cref.index as usize] = clause;
            cref
        } else {
            assert!(
                self.slots.len() < ClauseIndex::max_value() as usize,
                "Exceeded ClauseAlloc's maximal clause count"
            );
            self.slots.push(clause);
            ClauseRef {
                index: (self.slots.len() - 1) as ClauseIndex,
            }
        }
    }

    /// Release the slot of a clause.
    ///
    /// The clause is marked as deleted and its literals are dropped.
    pub fn free_clause(&mut self, cref: ClauseRef) {
        let clause = &mut self.slots[cref.index as usize];
        debug_assert!(!clause.header.deleted(), "free_clause for freed clause");
        clause.header.set_deleted(true);
        clause.lits = vec![];
        self.free.push(cref);
    }

    /// Access the header of a clause.
    pub fn header(&self, cref: ClauseRef) -> &ClauseHeader {
        &self.slots[cref.index as usize].header
    }

    /// Mutate the header of a clause.
    pub fn header_mut(&mut self, cref: ClauseRef) -> &mut ClauseHeader {
        &mut self.slots[cref.index as usize].header
    }

    /// Access a clause.
    pub fn clause(&self, cref: ClauseRef) -> &Clause {
        &self.slots[cref.index as usize]
    }

    /// Mutate a clause.
    pub fn clause_mut(&mut self, cref: ClauseRef) -> &mut Clause {
        &mut self.slots[cref.index as usize]
    }

    /// Number of clauses currently stored.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// Compact reference to a clause.
///
/// Used with [`ClauseAlloc`] to access the clause.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ClauseRef {
    index: ClauseIndex,
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::*;

    use cardsat_formula::test::sat_formula;

    proptest! {
        #[test]
        fn freed_slots_are_reused(
            input in sat_formula(4..30usize, 10..200usize, 0.1..0.9, 0.1..0.9),
        ) {
            let mut clause_alloc = ClauseAlloc::new();
            let mut clause_refs = vec![];

            let input: Vec<_> = input.into_iter().filter(|lits| lits.len() >= 2).collect();

            for clause_lits in input.iter() {
                clause_refs.push(clause_alloc.add_clause(ClauseHeader::new(), clause_lits));
            }

            for &cref in clause_refs.iter().step_by(2) {
                clause_alloc.free_clause(cref);
                prop_assert!(clause_alloc.header(cref).deleted());
            }

            let stored = clause_alloc.slots.len();

            for clause_lits in input.iter().step_by(2) {
                let mut reversed = clause_lits.clone();
                reversed.reverse();
                let cref = clause_alloc.add_clause(ClauseHeader::new(), &reversed);
                prop_assert_eq!(clause_alloc.clause(cref).lits(), &reversed[..]);
            }

            prop_assert_eq!(clause_alloc.slots.len(), stored);
            prop_assert_eq!(clause_alloc.len(), input.len());

            for (lits, &cref) in input.iter().zip(clause_refs.iter()).skip(1).step_by(2) {
                prop_assert_eq!(clause_alloc.clause(cref).lits(), &lits[..]);
            }
        }
    }
}
