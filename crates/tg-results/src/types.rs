//! Result data types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioManifest {
    /// Content hash over the scenario definition and solver version.
    pub run_id: String,
    /// Scenario entry name in the scenario file.
    pub scenario: String,
    /// Display tag; names the output directory.
    pub tag: String,
    /// UTC timestamp of the run.
    pub timestamp: String,
    pub solver_version: String,
    /// Names of the series files written for this scenario.
    pub series: Vec<String>,
}

/// One point of the ρ trade-off sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepPoint {
    pub rho: f64,
    /// Settling time of the capacitor voltage (seconds); absent when the
    /// trajectory never settles into the band.
    pub settling_time: Option<f64>,
    /// Mean inter-event time (seconds); absent when no interval was
    /// recorded.
    pub mean_inter_event_time: Option<f64>,
}
