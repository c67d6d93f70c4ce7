//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use tg_scenario::ScenarioDef;

pub fn compute_run_id(scenario_name: &str, scenario: &ScenarioDef, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(scenario_name.as_bytes());

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_scenario::{CircuitParamsDef, DesiredValuesDef, PcplBreakpointDef};

    fn scenario() -> ScenarioDef {
        ScenarioDef {
            ignore: false,
            end_time_simulation: 0.1,
            tag: "nominal".to_string(),
            initial_states_factor: [1.5, 0.13],
            circuit_params: CircuitParamsDef {
                input_voltage: 48.0,
                constant_resistance_load: 100.0,
                inductor_winding_resistance: 0.11,
                inductance: 4.7e-3,
                capacitance: 1.1e-3,
            },
            desired_values: DesiredValuesDef {
                pcpl_power: 50.0,
                capacitor_voltage: 24.0,
            },
            pcpl_signal_data: vec![PcplBreakpointDef { t: 0.0, pcpl: 50.0 }],
        }
    }

    #[test]
    fn hash_stability() {
        let s = scenario();
        assert_eq!(
            compute_run_id("scenario_1", &s, "v1"),
            compute_run_id("scenario_1", &s, "v1")
        );
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = scenario();
        let mut b = scenario();
        b.desired_values.pcpl_power = 60.0;
        assert_ne!(
            compute_run_id("scenario_1", &a, "v1"),
            compute_run_id("scenario_1", &b, "v1")
        );
        assert_ne!(
            compute_run_id("scenario_1", &a, "v1"),
            compute_run_id("scenario_2", &a, "v1")
        );
    }
}
