//! Result storage: per-scenario output directories with a manifest and
//! CSV series files.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::ResultsStore;
pub use types::{ScenarioManifest, SweepPoint};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Series columns have mismatched lengths: {what}")]
    ColumnMismatch { what: String },

    #[error("Scenario results not found: {tag}")]
    NotFound { tag: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
