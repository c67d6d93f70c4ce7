//! Hybrid closed-loop simulation engine.
//!
//! Provides:
//! - an explicit adaptive-step RK4(5) integrator with a hard step ceiling
//! - the closed-loop composer wiring plant, trigger policy, transmission
//!   hold, and state feedback into one coupled system
//! - open-loop runners for the plant variants
//! - simulation run records including event and inter-event-time series

pub mod closed_loop;
pub mod error;
pub mod integrator;
pub mod open_loop;
pub mod run;

pub use closed_loop::{ClosedLoopOptions, ClosedLoopSim};
pub use error::{SimError, SimResult};
pub use integrator::{AdaptiveRk45, ContinuousModel};
pub use open_loop::{Frame, OpenLoopOptions, OpenLoopRun, run_open_loop};
pub use run::{SimulationRun, inter_event_times, time_grid};
