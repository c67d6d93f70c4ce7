//! tg-scenario: canonical scenario file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_scenarios};

use std::path::Path;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file extension: {extension}")]
    UnsupportedExtension { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load and validate a scenario file, dispatching on the extension
/// (`.json`, `.yaml`, `.yml`).
pub fn load(path: &Path) -> ScenarioResult<ScenarioFile> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
    {
        "json" => load_json(path),
        "yaml" | "yml" => load_yaml(path),
        other => Err(ScenarioError::UnsupportedExtension {
            extension: other.to_string(),
        }),
    }
}

pub fn load_json(path: &Path) -> ScenarioResult<ScenarioFile> {
    let content = std::fs::read_to_string(path)?;
    let scenarios: ScenarioFile = serde_json::from_str(&content)?;
    validate_scenarios(&scenarios)?;
    Ok(scenarios)
}

pub fn load_yaml(path: &Path) -> ScenarioResult<ScenarioFile> {
    let content = std::fs::read_to_string(path)?;
    let scenarios: ScenarioFile = serde_yaml::from_str(&content)?;
    validate_scenarios(&scenarios)?;
    Ok(scenarios)
}

pub fn save_json(path: &Path, scenarios: &ScenarioFile) -> ScenarioResult<()> {
    validate_scenarios(scenarios)?;
    let content = serde_json::to_string_pretty(scenarios)?;
    std::fs::write(path, content)?;
    Ok(())
}
