//! Metadata stored with each clause.

/// Whether a stored clause is a disjunction or a cardinality constraint.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ClauseKind {
    Plain,
    /// At most `k` of the literals may be true, with `watchers = len - k + 1`.
    AtMost { watchers: usize },
}

/// Metadata for a clause.
#[derive(Clone, Debug)]
pub struct ClauseHeader {
    kind: ClauseKind,
    /// Snapshot id current when a learned clause was derived, `None` for irredundant clauses.
    learnt_on_state: Option<usize>,
    deleted: bool,
    can_be_deleted: bool,
    glue: usize,
    activity: f32,
}

impl Default for ClauseHeader {
    fn default() -> ClauseHeader {
        ClauseHeader {
            kind: ClauseKind::Plain,
            learnt_on_state: None,
            deleted: false,
            can_be_deleted: true,
            glue: 0,
            activity: 0.0,
        }
    }
}

impl ClauseHeader {
    /// Create a new clause header with default entries.
    pub fn new() -> ClauseHeader {
        Self::default()
    }

    pub fn kind(&self) -> ClauseKind {
        self.kind
    }

    pub fn is_at_most(&self) -> bool {
        self.kind != ClauseKind::Plain
    }

    /// Number of leading literals watched by an at-most-k constraint.
    ///
    /// Zero for plain clauses.
    pub fn at_most_watchers(&self) -> usize {
        match self.kind {
            ClauseKind::Plain => 0,
            ClauseKind::AtMost { watchers } => watchers,
        }
    }

    /// Turn the clause into an at-most-k constraint with the given number of watched literals.
    pub fn set_at_most_watchers(&mut self, watchers: usize) {
        debug_assert!(watchers >= 2);
        self.kind = ClauseKind::AtMost { watchers };
    }

    /// Whether the clause was derived during search.
    pub fn learnt(&self) -> bool {
        self.learnt_on_state.is_some()
    }

    /// Snapshot id current when this learned clause was derived.
    pub fn learnt_on_state(&self) -> Option<usize> {
        self.learnt_on_state
    }

    /// Mark the clause as learned while the given snapshot id was current.
    pub fn set_learnt_on_state(&mut self, state: usize) {
        self.learnt_on_state = Some(state);
    }

    /// Whether the clause is marked as deleted.
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    /// Mark the clause as deleted.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Whether the next clause database reduction may delete the clause.
    pub fn can_be_deleted(&self) -> bool {
        self.can_be_deleted
    }

    pub fn set_can_be_deleted(&mut self, can_be_deleted: bool) {
        self.can_be_deleted = can_be_deleted;
    }

    /// The glue level (LBD) of a learned clause.
    pub fn glue(&self) -> usize {
        self.glue
    }

    pub fn set_glue(&mut self, glue: usize) {
        self.glue = glue;
    }

    /// The activity of a learned clause.
    pub fn activity(&self) -> f32 {
        self.activity
    }

    pub fn set_activity(&mut self, activity: f32) {
        self.activity = activity;
    }
}
