//! Scenario compilation: schema definitions into runtime objects.

use crate::error::AppResult;
use tg_core::PiecewiseSignal;
use tg_core::units::{farads, henries, ohms, volts, watts};
use tg_plant::{CircuitParams, PlantParams};
use tg_scenario::ScenarioDef;

/// Runtime form of one scenario entry.
#[derive(Debug, Clone)]
pub struct CompiledScenario {
    pub params: PlantParams,
    /// Absolute load-power demand over time.
    pub perturbation: PiecewiseSignal,
    pub end_time: f64,
    pub x0_factor: [f64; 2],
}

/// Build plant parameters and the perturbation signal from a validated
/// scenario definition.
pub fn compile_scenario(def: &ScenarioDef) -> AppResult<CompiledScenario> {
    let circuit = CircuitParams::new(
        volts(def.circuit_params.input_voltage),
        ohms(def.circuit_params.inductor_winding_resistance),
        ohms(def.circuit_params.constant_resistance_load),
        henries(def.circuit_params.inductance),
        farads(def.circuit_params.capacitance),
    )?;
    let params = PlantParams::for_desired(
        circuit,
        watts(def.desired_values.pcpl_power),
        volts(def.desired_values.capacitor_voltage),
    )?;

    let breakpoints: Vec<(f64, f64)> = def
        .pcpl_signal_data
        .iter()
        .map(|b| (b.t, b.pcpl))
        .collect();
    let perturbation = PiecewiseSignal::new(breakpoints)?;

    Ok(CompiledScenario {
        params,
        perturbation,
        end_time: def.end_time_simulation,
        x0_factor: def.initial_states_factor,
    })
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
            pcpl_signal_data: vec![
                PcplBreakpointDef { t: 0.0, pcpl: 50.0 },
                PcplBreakpointDef { t: 0.05, pcpl: 65.0 },
            ],
        }
    }

    #[test]
    fn compiles_parameters_and_signal() {
        let compiled = compile_scenario(&scenario()).unwrap();

        assert_eq!(compiled.params.circuit.v_in, 48.0);
        assert_eq!(compiled.params.circuit.r_c, 100.0);
        let expected_i = 24.0 / 100.0 + 50.0 / 24.0;
        assert!((compiled.params.op.i_l - expected_i).abs() < 1e-12);

        assert_eq!(compiled.perturbation.value_at(0.01), 50.0);
        assert_eq!(compiled.perturbation.value_at(0.06), 65.0);
        assert_eq!(compiled.end_time, 0.1);
        assert_eq!(compiled.x0_factor, [1.5, 0.13]);
    }
}
