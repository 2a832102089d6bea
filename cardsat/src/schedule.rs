//! Scheduling of restarts, clause database reductions and VSIDS decay changes.
//!
//! Restarts follow Glucose: the solver restarts when the glue of recently learned clauses is high
//! compared to the average over all conflicts since the first solve call. Restarts are blocked for a
//! while when the trail grows much larger than usual, as the solver may be close to a model.
//!
//! The clause database is reduced every time the number of conflicts reaches a multiple of a
//! growing interval.
use crate::config::SolverConfig;

mod queue;

use queue::BoundedQueue;

/// Counters and moving averages used for scheduling.
#[derive(Default)]
pub struct Schedule {
    conflicts: u64,
    /// Conflicts counted for the global glue average.
    conflicts_restarts: u64,
    cur_restart: u64,
    nb_before_reduce: u64,
    sum_lbd: u64,
    lbd_queue: BoundedQueue,
    trail_queue: BoundedQueue,
    var_decay: f32,
}

impl Schedule {
    /// Reset all counters for the given configuration.
    pub fn configure(&mut self, config: &SolverConfig) {
        *self = Schedule::default();
        self.cur_restart = 1;
        self.nb_before_reduce = config.first_reduce_db;
        self.lbd_queue.set_capacity(config.size_lbd_queue);
        self.trail_queue.set_capacity(config.size_trail_queue);
        self.var_decay = config.var_decay;
    }

    /// Total number of conflicts.
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }

    /// Count a conflict.
    ///
    /// Returns the new VSIDS decay factor when it is due to be increased.
    pub fn count_conflict(&mut self, config: &SolverConfig) -> Option<f32> {
        self.conflicts += 1;
        self.conflicts_restarts += 1;

        if self.conflicts % config.var_decay_interval == 0 && self.var_decay < config.max_var_decay
        {
            self.var_decay = (self.var_decay + config.var_decay_step).min(config.max_var_decay);
            Some(self.var_decay)
        } else {
            None
        }
    }

    /// Record the trail size at a conflict and block an imminent restart if it is large.
    pub fn record_trail(&mut self, config: &SolverConfig, trail_len: usize) {
        self.trail_queue.push(trail_len as u64);
        if self.conflicts_restarts > config.lb_blocking_restart
            && self.lbd_queue.valid()
            && trail_len as f64 > config.factor_r * self.trail_queue.avg()
        {
            self.lbd_queue.fast_clear();
        }
    }

    /// Record the glue of a newly learned clause.
    pub fn record_glue(&mut self, glue: usize) {
        self.lbd_queue.push(glue as u64);
        self.sum_lbd += glue as u64;
    }

    /// Whether the solver should restart now.
    ///
    /// A positive answer clears the recent glue window, so the next restart needs a full window of
    /// new conflicts.
    pub fn restart_due(&mut self, config: &SolverConfig) -> bool {
        if self.lbd_queue.valid()
            && self.lbd_queue.avg() * config.factor_k
                > self.sum_lbd as f64 / self.conflicts_restarts as f64
        {
            self.lbd_queue.fast_clear();
            true
        } else {
            false
        }
    }

    /// Whether the clause database should be reduced now.
    pub fn reduce_due(&mut self, learnt_count: usize) -> bool {
        if self.nb_before_reduce == 0 {
            return false;
        }
        if learnt_count > 0 && self.conflicts >= self.cur_restart * self.nb_before_reduce {
            self.cur_restart = self.conflicts / self.nb_before_reduce + 1;
            true
        } else {
            false
        }
    }

    /// Grow the reduction interval after a reduction.
    ///
    /// `special_increments` counts the signs of a high quality clause database found during the
    /// reduction, each delaying the next reduction further.
    pub fn reduced(&mut self, config: &SolverConfig, special_increments: usize) {
        self.nb_before_reduce += config.special_inc_reduce_db * special_increments as u64;
        self.nb_before_reduce += config.inc_reduce_db;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SolverConfig {
        let mut config = SolverConfig::default();
        config.size_lbd_queue = 3;
        config.size_trail_queue = 3;
        config.first_reduce_db = 4;
        config.inc_reduce_db = 2;
        config.special_inc_reduce_db = 10;
        config.var_decay_interval = 2;
        config.lb_blocking_restart = 0;
        config
    }

    #[test]
    fn restarts_on_rising_glue() {
        let config = small_config();
        let mut schedule = Schedule::default();
        schedule.configure(&config);

        for &glue in [2, 2, 2, 2, 2, 2].iter() {
            schedule.count_conflict(&config);
            schedule.record_glue(glue);
        }
        assert!(!schedule.restart_due(&config));

        for &glue in [9, 9, 9].iter() {
            schedule.count_conflict(&config);
            schedule.record_glue(glue);
        }
        assert!(schedule.restart_due(&config));
        assert!(!schedule.restart_due(&config));
    }

    #[test]
    fn long_trail_blocks_restart() {
        let config = small_config();
        let mut schedule = Schedule::default();
        schedule.configure(&config);

        for &(glue, trail) in [(2, 10), (2, 10), (9, 10), (9, 10), (9, 30)].iter() {
            schedule.count_conflict(&config);
            schedule.record_trail(&config, trail);
            schedule.record_glue(glue);
        }
        // The glue window was cleared by the long trail and holds only the last glue.
        assert!(!schedule.restart_due(&config));
    }

    #[test]
    fn reduction_interval_grows() {
        let config = small_config();
        let mut schedule = Schedule::default();
        schedule.configure(&config);

        let mut reductions = vec![];
        for _ in 0..30 {
            schedule.count_conflict(&config);
            if schedule.reduce_due(1) {
                reductions.push(schedule.conflicts());
                schedule.reduced(&config, 0);
            }
        }
        assert!(!schedule.reduce_due(0));
        assert_eq!(reductions, vec![4, 12, 24]);
    }

    #[test]
    fn var_decay_increases_up_to_max() {
        let mut config = small_config();
        config.var_decay = 0.9;
        config.var_decay_step = 0.03;
        config.max_var_decay = 0.95;
        let mut schedule = Schedule::default();
        schedule.configure(&config);

        let decays: Vec<_> = (0..8)
            .filter_map(|_| schedule.count_conflict(&config))
            .collect();
        assert_eq!(decays.len(), 2);
        assert_eq!(decays[1], 0.95);
    }
}
