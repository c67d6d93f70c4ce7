//! Application-level error type aggregating the workspace crates.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Core error: {0}")]
    Core(#[from] tg_core::CoreError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] tg_scenario::ScenarioError),

    #[error("Results error: {0}")]
    Results(#[from] tg_results::ResultsError),

    #[error("Simulation error: {0}")]
    Sim(#[from] tg_sim::SimError),

    #[error("Design error: {0}")]
    Design(#[from] tg_design::DesignError),

    #[error("Plant error: {0}")]
    Plant(#[from] tg_plant::PlantError),

    #[error("Control error: {0}")]
    Control(#[from] tg_controls::ControlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
