//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during time integration and closed-loop runs.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<tg_plant::PlantError> for SimError {
    fn from(e: tg_plant::PlantError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<tg_controls::ControlError> for SimError {
    fn from(e: tg_controls::ControlError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<tg_core::CoreError> for SimError {
    fn from(e: tg_core::CoreError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
