//! Per-scenario batch execution and persistence.

use chrono::Utc;
use tracing::{info, warn};

use crate::compile::compile_scenario;
use crate::error::AppResult;
use tg_controls::{DynamicPolicy, StateFeedback, StaticPolicy, TriggerCondition};
use tg_design::solve_trigger_design;
use tg_plant::{LinearModel, LinearizedBuck, NonlinearBuck, OperatingPoint, ShiftedBuck};
use tg_results::{ResultsStore, ScenarioManifest, compute_run_id};
use tg_scenario::{ScenarioDef, ScenarioFile};
use tg_sim::{
    ClosedLoopOptions, ClosedLoopSim, Frame, OpenLoopOptions, OpenLoopRun, SimulationRun,
    run_open_loop,
};

pub const SOLVER_VERSION: &str = "0.1.0";

/// Options for scenario batch runs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Design weight ρ for the trigger solve.
    pub rho: f64,
    /// Reporting step Δt (seconds).
    pub step: f64,
    /// Dynamic-policy threshold parameter θ.
    pub theta: f64,
    /// Dynamic-policy decay rate λ.
    pub decay: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            rho: 0.5,
            step: 1e-5,
            theta: DynamicPolicy::DEFAULT_THETA,
            decay: DynamicPolicy::DEFAULT_DECAY,
        }
    }
}

/// Result handle of one completed scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: String,
    pub tag: String,
    pub run_id: String,
    pub series: Vec<String>,
}

/// Run every non-ignored scenario; failures are logged with the scenario
/// identity and the batch continues.
pub fn run_all(
    scenarios: &ScenarioFile,
    store: &ResultsStore,
    options: &RunOptions,
) -> AppResult<Vec<ScenarioOutcome>> {
    let mut outcomes = Vec::new();
    for (name, def) in scenarios {
        if def.ignore {
            info!(scenario = %def.tag, "skipped (ignore flag)");
            continue;
        }
        match run_scenario(name, def, store, options) {
            Ok(outcome) => outcomes.push(outcome),
            Err(error) => {
                warn!(scenario = %def.tag, %error, "scenario failed; continuing batch");
            }
        }
    }
    Ok(outcomes)
}

/// Run one scenario end to end: open-loop comparisons of the three plant
/// variants, the trigger design, closed loops under the static and the
/// dynamic policy on the shifted and linearized plants, and persistence.
pub fn run_scenario(
    name: &str,
    def: &ScenarioDef,
    store: &ResultsStore,
    options: &RunOptions,
) -> AppResult<ScenarioOutcome> {
    let compiled = compile_scenario(def)?;
    let tag = def.tag.clone();
    let op = compiled.params.op;
    info!(scenario = %tag, "new simulation started");

    let mut series: Vec<String> = Vec::new();

    let open_options = OpenLoopOptions {
        end_time: compiled.end_time,
        step: options.step,
        x0_factor: compiled.x0_factor,
        ..OpenLoopOptions::default()
    };

    let nonlinear = run_open_loop(
        &NonlinearBuck,
        &compiled.params,
        Some(compiled.perturbation.clone()),
        Frame::Absolute,
        &open_options,
    )?;
    store.write_series(
        &tag,
        "open_loop_nonlinear",
        &["time_s", "i_l_a", "v_c_v"],
        &[
            &nonlinear.time,
            &nonlinear.inductor_current,
            &nonlinear.capacitor_voltage,
        ],
    )?;
    series.push("open_loop_nonlinear".to_string());
    info!(scenario = %tag, "non-linear open-loop simulation finished");

    let shifted = run_open_loop(
        &ShiftedBuck,
        &compiled.params,
        Some(compiled.perturbation.clone()),
        Frame::Perturbation,
        &open_options,
    )?;
    write_open_loop_perturbation(store, &tag, "open_loop_shifted", &shifted, &op, &mut series)?;
    info!(scenario = %tag, "shifted non-linear open-loop simulation finished");

    let linearized_plant = LinearizedBuck::new(&compiled.params);
    let linearized = run_open_loop(
        &linearized_plant,
        &compiled.params,
        Some(compiled.perturbation.clone()),
        Frame::Perturbation,
        &open_options,
    )?;
    write_open_loop_perturbation(
        store,
        &tag,
        "open_loop_linearized",
        &linearized,
        &op,
        &mut series,
    )?;
    info!(scenario = %tag, "linearized open-loop simulation finished");

    let model = LinearModel::from_params(&compiled.params);
    let design = solve_trigger_design(&model, options.rho)?;
    info!(scenario = %tag, rho = options.rho, "trigger design parameters obtained");

    let condition = TriggerCondition::new(design.psi, design.xi)?;
    let feedback = StateFeedback::new(design.k)?;
    let closed_options = ClosedLoopOptions {
        end_time: compiled.end_time,
        step: options.step,
        x0_factor: compiled.x0_factor,
        ..ClosedLoopOptions::default()
    };

    {
        let mut policy = StaticPolicy::new(condition.clone());
        let run = ClosedLoopSim::new(
            &ShiftedBuck,
            &compiled.params,
            &mut policy,
            feedback.clone(),
            Some(compiled.perturbation.clone()),
        )
        .run(&closed_options)?;
        write_closed_loop(store, &tag, "static_etm_shifted", &run, &op, &mut series)?;
        info!(scenario = %tag, events = run.event_times.len(), "static policy on shifted plant finished");
    }
    {
        let mut policy = StaticPolicy::new(condition.clone());
        let run = ClosedLoopSim::new(
            &linearized_plant,
            &compiled.params,
            &mut policy,
            feedback.clone(),
            Some(compiled.perturbation.clone()),
        )
        .run(&closed_options)?;
        write_closed_loop(store, &tag, "static_etm_linearized", &run, &op, &mut series)?;
        info!(scenario = %tag, events = run.event_times.len(), "static policy on linearized plant finished");
    }
    {
        let mut policy = DynamicPolicy::new(condition.clone(), options.theta, options.decay);
        let run = ClosedLoopSim::new(
            &ShiftedBuck,
            &compiled.params,
            &mut policy,
            feedback.clone(),
            Some(compiled.perturbation.clone()),
        )
        .run(&closed_options)?;
        write_closed_loop(store, &tag, "dynamic_etm_shifted", &run, &op, &mut series)?;
        info!(scenario = %tag, events = run.event_times.len(), "dynamic policy on shifted plant finished");
    }
    {
        let mut policy = DynamicPolicy::new(condition, options.theta, options.decay);
        let run = ClosedLoopSim::new(
            &linearized_plant,
            &compiled.params,
            &mut policy,
            feedback,
            Some(compiled.perturbation.clone()),
        )
        .run(&closed_options)?;
        write_closed_loop(store, &tag, "dynamic_etm_linearized", &run, &op, &mut series)?;
        info!(scenario = %tag, events = run.event_times.len(), "dynamic policy on linearized plant finished");
    }

    let manifest = ScenarioManifest {
        run_id: compute_run_id(name, def, SOLVER_VERSION),
        scenario: name.to_string(),
        tag: tag.clone(),
        timestamp: Utc::now().to_rfc3339(),
        solver_version: SOLVER_VERSION.to_string(),
        series: series.clone(),
    };
    store.save_manifest(&manifest)?;
    info!(scenario = %tag, "scenario results saved");

    Ok(ScenarioOutcome {
        name: name.to_string(),
        tag,
        run_id: manifest.run_id,
        series,
    })
}

/// Perturbation-frame open-loop series with absolute columns alongside.
fn write_open_loop_perturbation(
    store: &ResultsStore,
    tag: &str,
    name: &str,
    run: &OpenLoopRun,
    op: &OperatingPoint,
    series: &mut Vec<String>,
) -> AppResult<()> {
    let abs_i: Vec<f64> = run.inductor_current.iter().map(|v| v + op.i_l).collect();
    let abs_v: Vec<f64> = run.capacitor_voltage.iter().map(|v| v + op.v_c).collect();
    store.write_series(
        tag,
        name,
        &["time_s", "delta_i_l_a", "delta_v_c_v", "i_l_a", "v_c_v"],
        &[
            &run.time,
            &run.inductor_current,
            &run.capacitor_voltage,
            &abs_i,
            &abs_v,
        ],
    )?;
    series.push(name.to_string());
    Ok(())
}

/// Closed-loop series (state, duty, optional η) plus the event table.
fn write_closed_loop(
    store: &ResultsStore,
    tag: &str,
    name: &str,
    run: &SimulationRun,
    op: &OperatingPoint,
    series: &mut Vec<String>,
) -> AppResult<()> {
    let abs_i: Vec<f64> = run.inductor_current.iter().map(|v| v + op.i_l).collect();
    let abs_v: Vec<f64> = run.capacitor_voltage.iter().map(|v| v + op.v_c).collect();
    let abs_d: Vec<f64> = run.duty.iter().map(|v| v + op.d).collect();

    let mut header = vec![
        "time_s",
        "delta_i_l_a",
        "delta_v_c_v",
        "i_l_a",
        "v_c_v",
        "delta_duty",
        "duty",
    ];
    let mut columns: Vec<&[f64]> = vec![
        &run.time,
        &run.inductor_current,
        &run.capacitor_voltage,
        &abs_i,
        &abs_v,
        &run.duty,
        &abs_d,
    ];
    if let Some(aux) = &run.aux {
        header.push("eta");
        columns.push(aux);
    }
    store.write_series(tag, name, &header, &columns)?;
    series.push(name.to_string());

    let events_name = format!("{name}_events");
    store.write_series(
        tag,
        &events_name,
        &["event_time_s", "inter_event_time_s"],
        &[&run.event_times, &run.inter_event_times],
    )?;
    series.push(events_name);
    Ok(())
}
