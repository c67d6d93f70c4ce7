//! Trade-off sweep over the design weight ρ.
//!
//! For each ρ on the grid the trigger design is re-solved and the
//! linearized closed loop re-run under the static policy; the settling
//! time of the capacitor voltage and the mean inter-event time are
//! collected for trade-off analysis. Infeasible or numerically failed
//! ρ values are logged and skipped without aborting the sweep.

use tracing::{info, warn};

use crate::compile::compile_scenario;
use crate::error::AppResult;
use crate::metrics::{mean_inter_event_time, settling_time};
use tg_controls::{StateFeedback, StaticPolicy, TriggerCondition};
use tg_design::solve_trigger_design;
use tg_plant::{LinearModel, LinearizedBuck};
use tg_results::{ResultsStore, SweepPoint};
use tg_scenario::ScenarioDef;
use tg_sim::{ClosedLoopOptions, ClosedLoopSim};

/// Sweep grid and metric configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub rho_start: f64,
    pub rho_step: f64,
    pub rho_end: f64,
    /// Relative settling band around the final capacitor voltage.
    pub settling_tolerance: f64,
    /// Reporting step Δt (seconds).
    pub step: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rho_start: 0.1,
            rho_step: 0.1,
            rho_end: 1.0,
            settling_tolerance: 0.02,
            step: 1e-5,
        }
    }
}

/// Grid of ρ values: start, start+step, ... up to end, with values ≥ 1
/// excluded.
fn rho_grid(config: &SweepConfig) -> Vec<f64> {
    let mut grid = Vec::new();
    if !(config.rho_step > 0.0) {
        return grid;
    }
    let mut k = 0usize;
    loop {
        let rho = config.rho_start + k as f64 * config.rho_step;
        if rho > config.rho_end + 1e-12 {
            break;
        }
        if rho < 1.0 {
            grid.push(rho);
        }
        k += 1;
    }
    grid
}

/// Run the ρ sweep for one scenario and persist the trade-off table.
pub fn run_sweep(
    name: &str,
    def: &ScenarioDef,
    store: &ResultsStore,
    config: &SweepConfig,
) -> AppResult<Vec<SweepPoint>> {
    let compiled = compile_scenario(def)?;
    let tag = &def.tag;
    let model = LinearModel::from_params(&compiled.params);
    let plant = LinearizedBuck::new(&compiled.params);
    let op = compiled.params.op;

    let closed_options = ClosedLoopOptions {
        end_time: compiled.end_time,
        step: config.step,
        x0_factor: compiled.x0_factor,
        ..ClosedLoopOptions::default()
    };

    let mut points = Vec::new();
    for rho in rho_grid(config) {
        let design = match solve_trigger_design(&model, rho) {
            Ok(design) => design,
            Err(error) => {
                warn!(scenario = %tag, rho, %error, "design solve failed; skipping this rho");
                continue;
            }
        };

        let condition = TriggerCondition::new(design.psi, design.xi)?;
        let feedback = StateFeedback::new(design.k)?;
        let mut policy = StaticPolicy::new(condition);
        let run = match ClosedLoopSim::new(
            &plant,
            &compiled.params,
            &mut policy,
            feedback,
            Some(compiled.perturbation.clone()),
        )
        .run(&closed_options)
        {
            Ok(run) => run,
            Err(error) => {
                warn!(scenario = %tag, rho, %error, "simulation failed; skipping this rho");
                continue;
            }
        };

        let absolute_voltage: Vec<f64> =
            run.capacitor_voltage.iter().map(|v| v + op.v_c).collect();
        let point = SweepPoint {
            rho,
            settling_time: settling_time(&run.time, &absolute_voltage, config.settling_tolerance),
            mean_inter_event_time: mean_inter_event_time(&run.inter_event_times),
        };
        info!(
            scenario = %tag,
            rho,
            settling = ?point.settling_time,
            mean_iet = ?point.mean_inter_event_time,
            "sweep point collected"
        );
        points.push(point);
    }

    store.write_sweep(tag, &points)?;
    info!(scenario = %tag, points = points.len(), name, "sweep results saved");
    Ok(points)
}
