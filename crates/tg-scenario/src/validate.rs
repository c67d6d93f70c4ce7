//! Scenario validation logic.

use crate::schema::{ScenarioDef, ScenarioFile};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason}) in scenario '{scenario}'")]
    InvalidValue {
        scenario: String,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Empty scenario file")]
    Empty,
}

pub fn validate_scenarios(scenarios: &ScenarioFile) -> Result<(), ValidationError> {
    if scenarios.is_empty() {
        return Err(ValidationError::Empty);
    }
    for (name, scenario) in scenarios {
        validate_scenario(name, scenario)?;
    }
    Ok(())
}

fn invalid(
    scenario: &str,
    field: &str,
    value: impl std::fmt::Display,
    reason: &str,
) -> ValidationError {
    ValidationError::InvalidValue {
        scenario: scenario.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(
    scenario: &str,
    field: &str,
    value: f64,
) -> Result<(), ValidationError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid(scenario, field, value, "must be positive and finite"));
    }
    Ok(())
}

fn validate_scenario(name: &str, scenario: &ScenarioDef) -> Result<(), ValidationError> {
    if scenario.tag.is_empty() || scenario.tag.contains(['/', '\\']) {
        return Err(invalid(
            name,
            "tag",
            &scenario.tag,
            "must be non-empty and free of path separators",
        ));
    }

    require_positive(name, "end_time_simulation", scenario.end_time_simulation)?;

    for (i, factor) in scenario.initial_states_factor.iter().enumerate() {
        if !factor.is_finite() {
            return Err(invalid(
                name,
                &format!("initial_states_factor[{i}]"),
                factor,
                "must be finite",
            ));
        }
    }

    let circuit = &scenario.circuit_params;
    require_positive(name, "circuit_params.input_voltage", circuit.input_voltage)?;
    require_positive(
        name,
        "circuit_params.constant_resistance_load",
        circuit.constant_resistance_load,
    )?;
    if !(circuit.inductor_winding_resistance >= 0.0)
        || !circuit.inductor_winding_resistance.is_finite()
    {
        return Err(invalid(
            name,
            "circuit_params.inductor_winding_resistance",
            circuit.inductor_winding_resistance,
            "must be non-negative and finite",
        ));
    }
    require_positive(name, "circuit_params.inductance", circuit.inductance)?;
    require_positive(name, "circuit_params.capacitance", circuit.capacitance)?;

    require_positive(name, "desired_values.pcpl_power", scenario.desired_values.pcpl_power)?;
    require_positive(
        name,
        "desired_values.capacitor_voltage",
        scenario.desired_values.capacitor_voltage,
    )?;

    if scenario.pcpl_signal_data.is_empty() {
        return Err(invalid(
            name,
            "pcpl_signal_data",
            "[]",
            "needs at least one breakpoint",
        ));
    }
    for breakpoint in &scenario.pcpl_signal_data {
        if !breakpoint.t.is_finite() || !breakpoint.pcpl.is_finite() {
            return Err(invalid(
                name,
                "pcpl_signal_data",
                format!("(t = {}, pcpl = {})", breakpoint.t, breakpoint.pcpl),
                "breakpoints must be finite",
            ));
        }
    }
    for pair in scenario.pcpl_signal_data.windows(2) {
        if pair[1].t <= pair[0].t {
            return Err(invalid(
                name,
                "pcpl_signal_data",
                format!("t = {} after t = {}", pair[1].t, pair[0].t),
                "breakpoint times must be strictly increasing",
            ));
        }
    }

    Ok(())
}
