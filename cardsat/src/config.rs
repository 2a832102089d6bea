//! Solver configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardsat_macros::DocDefault;

/// How aggressively learned clauses are shortened after conflict analysis.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseMinimization {
    /// Keep the first UIP clause as is.
    None,
    /// Remove literals whose reason only contains literals of the clause.
    Basic,
    /// Remove literals that are implied by the remaining literals of the clause.
    Deep,
}

impl Default for ClauseMinimization {
    fn default() -> ClauseMinimization {
        ClauseMinimization::Deep
    }
}

/// Configurable parameters used during solving.
#[derive(DocDefault, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Initial multiplicative decay for the VSIDS decision heuristic. (Default: 0.8)
    pub var_decay: f32,

    /// Upper bound for the VSIDS decay. (Default: 0.95)
    pub max_var_decay: f32,

    /// Amount added to the VSIDS decay every `var_decay_interval` conflicts. (Default: 0.01)
    pub var_decay_step: f32,

    /// Number of conflicts between increases of the VSIDS decay. (Default: 5000)
    pub var_decay_interval: u64,

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_decay: f32,

    /// Minimization applied to learned clauses. (Default: ClauseMinimization::Deep)
    pub clause_minimization: ClauseMinimization,

    /// Polarity used for variables created on first reference by name. (Default: true)
    pub initial_phase: bool,

    /// Record clause additions and deletions as a DRUP proof. (Default: false)
    pub proof_generation: bool,

    /// Maximal LBD of a learned clause for binary resolution minimization. (Default: 6)
    pub lb_lbd_minimizing_clause: usize,

    /// Learned clauses up to this LBD are protected for one reduction when their LBD improves.
    /// (Default: 30)
    pub lb_lbd_frozen_clause: usize,

    /// Maximal length of a learned clause for binary resolution minimization. (Default: 30)
    pub lb_size_minimizing_clause: usize,

    /// Number of conflicts before the first clause database reduction. (Default: 2000)
    pub first_reduce_db: u64,

    /// Extra delay of the next reduction when the kept clauses are of high quality.
    /// (Default: 1000)
    pub special_inc_reduce_db: u64,

    /// Increase of the reduction interval after each reduction. (Default: 300)
    pub inc_reduce_db: u64,

    /// Restart when the recent LBD average scaled by this exceeds the global average.
    /// (Default: 0.8)
    pub factor_k: f64,

    /// Block restarts when the trail exceeds its recent average scaled by this. (Default: 1.4)
    pub factor_r: f64,

    /// Window size of the recent LBD average. (Default: 50)
    pub size_lbd_queue: usize,

    /// Window size of the recent trail size average. (Default: 5000)
    pub size_trail_queue: usize,

    /// Use clause length instead of LBD for short clauses. (Default: false)
    pub reduce_on_size: bool,

    /// Clauses shorter than this are rated by length when `reduce_on_size` is set. (Default: 12)
    pub reduce_on_size_size: usize,

    /// Number of conflicts since the last restart before restarts can be blocked.
    /// (Default: 10000)
    pub lb_blocking_restart: u64,
}

/// Invalid solver configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be in (1/16, 1), got {value}")]
    DecayOutOfRange { name: &'static str, value: f32 },
    #[error("var_decay ({initial}) exceeds max_var_decay ({max})")]
    DecayAboveMaximum { initial: f32, max: f32 },
    #[error("{name} must be positive")]
    ZeroParameter { name: &'static str },
}

impl SolverConfig {
    /// Check that all parameters are within their supported ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &(name, value) in [
            ("var_decay", self.var_decay),
            ("max_var_decay", self.max_var_decay),
            ("clause_decay", self.clause_decay),
        ]
        .iter()
        {
            if !(value > 1.0 / 16.0 && value < 1.0) {
                return Err(ConfigError::DecayOutOfRange { name, value });
            }
        }

        if self.var_decay > self.max_var_decay {
            return Err(ConfigError::DecayAboveMaximum {
                initial: self.var_decay,
                max: self.max_var_decay,
            });
        }

        for &(name, value) in [
            ("size_lbd_queue", self.size_lbd_queue as u64),
            ("size_trail_queue", self.size_trail_queue as u64),
            ("var_decay_interval", self.var_decay_interval),
            ("first_reduce_db", self.first_reduce_db),
        ]
        .iter()
        {
            if value == 0 {
                return Err(ConfigError::ZeroParameter { name });
            }
        }

        Ok(())
    }
}
