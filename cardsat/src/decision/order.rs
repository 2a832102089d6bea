//! Caller supplied decision order.
use cardsat_formula::Lit;

/// Literals to decide on first, in order.
///
/// Once all of them are assigned, decisions fall back to VSIDS. The scan position is reset at the
/// start of each search round and moved back on backjumps.
#[derive(Default)]
pub struct SelectionOrder {
    lits: Vec<Lit>,
    index: usize,
}

impl SelectionOrder {
    /// Replace the order.
    pub fn set(&mut self, lits: Vec<Lit>) {
        self.lits = lits;
        self.index = 0;
    }

    pub fn clear(&mut self) {
        self.lits.clear();
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// Continue scanning from the given position.
    pub fn rewind(&mut self, index: usize) {
        self.index = index;
    }

    /// Next literal of the order that passes the given filter.
    ///
    /// Skipped literals are not revisited until the scan position is rewound.
    pub fn next_unassigned(&mut self, mut unassigned: impl FnMut(Lit) -> bool) -> Option<Lit> {
        while let Some(&lit) = self.lits.get(self.index) {
            self.index += 1;
            if unassigned(lit) {
                return Some(lit);
            }
        }
        None
    }

    /// Drop literals of variables beyond the given count.
    pub fn set_var_count(&mut self, count: usize) {
        self.lits.retain(|lit| lit.index() < count);
        self.index = self.index.min(self.lits.len());
    }
}
