//! Buck converter plant models.
//!
//! Provides:
//! - circuit parameters and the closed-form operating point
//! - linear model extraction around the operating point
//! - a capability trait over the plant variants (nonlinear,
//!   shifted-nonlinear, linearized) used by the closed-loop composer

pub mod error;
pub mod linearize;
pub mod model;
pub mod params;

pub use error::{PlantError, PlantResult};
pub use linearize::LinearModel;
pub use model::{LinearizedBuck, NonlinearBuck, PlantInput, PlantModel, ShiftedBuck};
pub use params::{CircuitParams, OperatingPoint, PlantParams};
