//! Error types for plant models.

use thiserror::Error;

pub type PlantResult<T> = Result<T, PlantError>;

#[derive(Error, Debug)]
pub enum PlantError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Numeric error: {message}")]
    Numeric { message: String },
}

impl From<tg_core::CoreError> for PlantError {
    fn from(e: tg_core::CoreError) -> Self {
        PlantError::Numeric {
            message: e.to_string(),
        }
    }
}
