//! Shared application service layer for triggerflow.
//!
//! Centralizes the per-scenario batch pipeline (open-loop comparisons,
//! trigger design, closed-loop runs, persistence), the trade-off sweep
//! driver, and the metrics shared between them, so frontends only handle
//! argument parsing and presentation.

pub mod compile;
pub mod error;
pub mod metrics;
pub mod run_service;
pub mod scenario_service;
pub mod sweep;

pub use compile::{CompiledScenario, compile_scenario};
pub use error::{AppError, AppResult};
pub use metrics::{mean_inter_event_time, settling_time};
pub use run_service::{RunOptions, SOLVER_VERSION, ScenarioOutcome, run_all, run_scenario};
pub use scenario_service::{ScenarioSummary, list_scenarios, load_scenarios};
pub use sweep::{SweepConfig, run_sweep};
