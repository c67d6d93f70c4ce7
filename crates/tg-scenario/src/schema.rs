//! Scenario schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scenario file: named scenario entries, processed in name order.
pub type ScenarioFile = BTreeMap<String, ScenarioDef>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    /// Skip this scenario without simulating it.
    #[serde(default)]
    pub ignore: bool,
    /// Final simulation time (seconds).
    pub end_time_simulation: f64,
    /// Display tag; also names the results directory.
    pub tag: String,
    /// Initial-state scaling factors for (inductor current, capacitor voltage).
    pub initial_states_factor: [f64; 2],
    pub circuit_params: CircuitParamsDef,
    pub desired_values: DesiredValuesDef,
    /// Piecewise-constant load-power demand.
    pub pcpl_signal_data: Vec<PcplBreakpointDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitParamsDef {
    /// Input voltage (V).
    pub input_voltage: f64,
    /// Constant-resistance load in parallel with the capacitor (Ω).
    pub constant_resistance_load: f64,
    /// Inductor winding resistance (Ω).
    pub inductor_winding_resistance: f64,
    /// Inductance (H).
    pub inductance: f64,
    /// Capacitance (F).
    pub capacitance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesiredValuesDef {
    /// Desired constant-power-load demand (W).
    pub pcpl_power: f64,
    /// Desired capacitor voltage (V).
    pub capacitor_voltage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcplBreakpointDef {
    /// Switch time (seconds).
    pub t: f64,
    /// Power demand from this time on (W).
    pub pcpl: f64,
}
