//! Error types for the trigger-design solve.

use thiserror::Error;

pub type DesignResult<T> = Result<T, DesignError>;

#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The feasibility problem admits no strictly feasible point; the
    /// caller should skip this configuration and continue.
    #[error("Trigger design problem is infeasible (best slack {slack:.3e})")]
    Infeasible { slack: f64 },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}
