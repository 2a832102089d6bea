//! The VSIDS branching heuristic.
//!
//! Each variable has an activity. Variables occurring in conflict analysis are bumped and after
//! each conflict all activities decay. Decisions branch on the unassigned variable of highest
//! activity. Which variables get bumped follows Glucose, see `analyze_conflict`.
//!
//! Decaying is done lazily by growing the bump value instead, rescaling everything when the values
//! get too large. Only the order of activities matters, so the common scaling factor is ignored.

use ordered_float::OrderedFloat;

use cardsat_formula::Var;

use crate::config::SolverConfig;

/// Where a variable currently is with respect to the decision heap.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Slot {
    /// In the heap at the given position.
    Queued(usize),
    /// Not in the heap, inserted again when it becomes available.
    Idle,
    /// Never used for decisions.
    Ineligible,
}

/// The VSIDS branching heuristic.
///
/// Iterating yields and removes variables in order of decreasing activity.
pub struct Vsids {
    activity: Vec<OrderedFloat<f32>>,
    /// Max-heap of variables ordered by activity.
    heap: Vec<Var>,
    slots: Vec<Slot>,
    bump: f32,
    inv_decay: f32,
}

impl Default for Vsids {
    fn default() -> Vsids {
        Vsids {
            activity: vec![],
            heap: vec![],
            slots: vec![],
            bump: 1.0,
            inv_decay: 1.0 / SolverConfig::default().var_decay,
        }
    }
}

impl Vsids {
    /// Update structures for a new variable count.
    ///
    /// New variables start with zero activity and are queued for decisions. Removed variables are
    /// taken out of the heap.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.slots.len();

        for index in count..old_count {
            self.remove(Var::from_index(index));
        }

        self.activity.resize(count, OrderedFloat(0.0));
        self.slots.resize(count, Slot::Idle);

        for index in old_count..count {
            self.make_available(Var::from_index(index));
        }
    }

    /// Change whether a variable may be used as decision.
    pub fn set_eligible(&mut self, var: Var, eligible: bool) {
        match (self.slots[var.index()], eligible) {
            (Slot::Ineligible, true) => {
                self.slots[var.index()] = Slot::Idle;
                self.make_available(var);
            }
            (Slot::Ineligible, false) | (_, true) => (),
            (_, false) => {
                self.remove(var);
                self.slots[var.index()] = Slot::Ineligible;
            }
        }
    }

    pub fn is_eligible(&self, var: Var) -> bool {
        self.slots[var.index()] != Slot::Ineligible
    }

    fn rescale_limit() -> f32 {
        std::f32::MAX / 16.0
    }

    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }

    /// Increase the activity of a variable.
    pub fn bump(&mut self, var: Var) {
        let activity = &mut self.activity[var.index()];
        activity.0 += self.bump;
        if activity.0 >= Self::rescale_limit() {
            self.rescale();
        }
        if let Slot::Queued(pos) = self.slots[var.index()] {
            self.sift_up(pos);
        }
    }

    /// Decay all variable activities.
    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
        if self.bump >= Self::rescale_limit() {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        let factor = 1.0 / Self::rescale_limit();
        for activity in self.activity.iter_mut() {
            activity.0 *= factor;
        }
        self.bump *= factor;
    }

    /// Queue a variable for decisions unless it is queued already or ineligible.
    pub fn make_available(&mut self, var: Var) {
        if self.slots[var.index()] == Slot::Idle {
            let pos = self.heap.len();
            self.heap.push(var);
            self.slots[var.index()] = Slot::Queued(pos);
            self.sift_up(pos);
        }
    }

    /// Take a variable out of the heap.
    pub fn make_unavailable(&mut self, var: Var) {
        self.remove(var);
    }

    /// Remove a queued variable, leaving it idle.
    fn remove(&mut self, var: Var) {
        let pos = match self.slots[var.index()] {
            Slot::Queued(pos) => pos,
            _ => return,
        };
        self.slots[var.index()] = Slot::Idle;

        if let Some(last) = self.heap.pop() {
            if pos < self.heap.len() {
                self.place(pos, last);
                self.sift_down(pos);
                if let Slot::Queued(pos) = self.slots[last.index()] {
                    self.sift_up(pos);
                }
            }
        }
    }

    fn place(&mut self, pos: usize, var: Var) {
        self.heap[pos] = var;
        self.slots[var.index()] = Slot::Queued(pos);
    }

    /// Current activity of a variable.
    pub fn activity(&self, var: Var) -> OrderedFloat<f32> {
        self.activity[var.index()]
    }

    /// Move the variable at `pos` towards the root while its parent is less active.
    ///
    /// Parents are moved down into the hole, the variable is placed once at the end.
    fn sift_up(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        let activity = self.activity(var);
        while pos > 0 {
            let parent_pos = (pos - 1) / 2;
            let parent = self.heap[parent_pos];
            if self.activity(parent) >= activity {
                break;
            }
            self.place(pos, parent);
            pos = parent_pos;
        }
        self.place(pos, var);
    }

    /// Move the variable at `pos` away from the root while a child is more active.
    fn sift_down(&mut self, mut pos: usize) {
        let var = self.heap[pos];
        let activity = self.activity(var);
        loop {
            let left = pos * 2 + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.heap.len()
                && self.activity(self.heap[right]) > self.activity(self.heap[left])
            {
                right
            } else {
                left
            };
            if self.activity(self.heap[child]) <= activity {
                break;
            }
            let child_var = self.heap[child];
            self.place(pos, child_var);
            pos = child;
        }
        self.place(pos, var);
    }
}

impl Iterator for Vsids {
    type Item = Var;

    fn next(&mut self) -> Option<Var> {
        let top = *self.heap.first()?;
        self.remove(top);
        Some(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cardsat_formula::{var, vars};

    /// Bump the variable with index `i` exactly `i` times.
    fn staircase(vsids: &mut Vsids, count: usize) {
        for index in 0..count {
            for _ in 0..index {
                vsids.bump(Var::from_index(index));
            }
        }
    }

    #[test]
    fn pops_by_activity() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(7);
        staircase(&mut vsids, 7);

        let order: Vec<_> = (&mut vsids).collect();
        assert_eq!(order, vars![7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(vsids.next(), None);

        // Requeued in scrambled order, still popped by activity.
        for i in 0..7 {
            vsids.make_available(Var::from_index((i * 3) % 7));
        }
        vsids.make_available(var!(2));
        assert_eq!(vsids.next(), Some(var!(7)));
        assert_eq!(vsids.next(), Some(var!(6)));
    }

    #[test]
    fn bumping_reorders_queued_vars() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(5);
        vsids.set_decay(0.5);
        staircase(&mut vsids, 5);

        vsids.decay();
        vsids.decay();
        vsids.decay();
        // One bump now outweighs four earlier ones.
        vsids.bump(var!(1));
        vsids.bump(var!(2));

        assert_eq!(vsids.next(), Some(var!(2)));
        assert_eq!(vsids.next(), Some(var!(1)));
        assert_eq!(vsids.next(), Some(var!(5)));
    }

    #[test]
    fn removal_from_the_middle() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(9);
        staircase(&mut vsids, 9);

        vsids.make_unavailable(var!(5));
        vsids.make_unavailable(var!(9));
        vsids.make_unavailable(var!(5));

        let order: Vec<_> = (&mut vsids).collect();
        assert_eq!(order, vars![8, 7, 6, 4, 3, 2, 1]);
    }

    #[test]
    fn rescaling_keeps_ratios() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(4);
        vsids.set_decay(1.0 / 8.0);
        staircase(&mut vsids, 4);

        for _ in 0..60 {
            vsids.decay();
        }
        vsids.bump(var!(4));

        // Doubling is exact, so the ratio survives rescaling
        assert_eq!(vsids.activity[0].0, 0.0);
        assert_eq!(vsids.activity[2].0, vsids.activity[1].0 * 2.0);
        assert!(vsids.activity[3] > vsids.activity[2]);
        assert_eq!(vsids.next(), Some(var!(4)));
    }

    #[test]
    fn ineligible_vars_stay_out() {
        let mut vsids = Vsids::default();
        vsids.set_var_count(6);
        staircase(&mut vsids, 6);

        vsids.set_eligible(var!(4), false);
        vsids.make_available(var!(4));
        vsids.make_unavailable(var!(2));

        let order: Vec<_> = (&mut vsids).collect();
        assert_eq!(order, vars![6, 5, 3, 1]);

        for i in 0..6 {
            vsids.make_available(Var::from_index(i));
        }
        vsids.set_var_count(3);
        assert!(vsids.is_eligible(var!(3)));

        let order: Vec<_> = (&mut vsids).collect();
        assert_eq!(order, vars![3, 2, 1]);

        vsids.set_var_count(6);
        assert!(vsids.is_eligible(var!(4)));
        vsids.bump(var!(6));
        vsids.set_eligible(var!(6), false);
        assert!(!vsids.is_eligible(var!(6)));
        vsids.set_eligible(var!(6), true);
        assert_eq!(vsids.next(), Some(var!(6)));
    }
}
