//! Open-loop plant simulation.
//!
//! Drives a plant variant with the duty cycle held at its operating value
//! and the load power following the perturbation signal; no feedback and
//! no trigger are involved. Used to compare the plant variants against
//! each other.

use nalgebra::{DVector, Vector2};

use crate::error::SimResult;
use crate::integrator::{AdaptiveRk45, ContinuousModel};
use crate::run::time_grid;
use tg_core::{PiecewiseSignal, Real};
use tg_plant::{PlantInput, PlantModel, PlantParams};

/// Coordinate frame the plant variant is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Absolute states and inputs (the nonlinear plant).
    Absolute,
    /// Perturbations around the operating point (shifted and linearized
    /// plants).
    Perturbation,
}

/// Recorded open-loop run, in the frame of the simulated variant.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLoopRun {
    pub time: Vec<Real>,
    pub inductor_current: Vec<Real>,
    pub capacitor_voltage: Vec<Real>,
}

/// Options for open-loop runs (shared defaults with the closed loop).
#[derive(Debug, Clone)]
pub struct OpenLoopOptions {
    pub end_time: Real,
    pub step: Real,
    pub x0_factor: [Real; 2],
    pub integrator: AdaptiveRk45,
}

impl Default for OpenLoopOptions {
    fn default() -> Self {
        Self {
            end_time: 0.1,
            step: 1e-5,
            x0_factor: [1.5, 0.13],
            integrator: AdaptiveRk45::default(),
        }
    }
}

struct OpenLoopModel<'m, P: PlantModel> {
    plant: &'m P,
    params: &'m PlantParams,
    duty: Real,
    power: &'m PiecewiseSignal,
}

impl<'m, P: PlantModel> ContinuousModel for OpenLoopModel<'m, P> {
    fn rhs(&mut self, t: Real, x: &DVector<Real>) -> SimResult<DVector<Real>> {
        let state = Vector2::new(x[0], x[1]);
        let input = PlantInput {
            duty: self.duty,
            p_cpl: self.power.value_at(t),
        };
        let dx = self.plant.derivative(t, &state, &input, self.params)?;
        Ok(DVector::from_vec(vec![dx[0], dx[1]]))
    }
}

/// Simulate a plant variant open loop over the reporting grid.
///
/// `perturbation` is the absolute power demand; when absent the load stays
/// at its operating value. In the perturbation frame the initial state and
/// the inputs are shifted by the operating point.
pub fn run_open_loop<P: PlantModel>(
    plant: &P,
    params: &PlantParams,
    perturbation: Option<PiecewiseSignal>,
    frame: Frame,
    options: &OpenLoopOptions,
) -> SimResult<OpenLoopRun> {
    let grid = time_grid(options.end_time, options.step)?;
    let op = params.op;

    let power = perturbation.unwrap_or_else(|| PiecewiseSignal::constant(op.p_cpl));
    let (power, duty, mut x) = match frame {
        Frame::Absolute => (
            power,
            op.d,
            DVector::from_vec(vec![
                options.x0_factor[0] * op.i_l,
                options.x0_factor[1] * op.v_c,
            ]),
        ),
        Frame::Perturbation => (
            power.shifted(op.p_cpl),
            0.0,
            DVector::from_vec(vec![
                options.x0_factor[0] * op.i_l - op.i_l,
                options.x0_factor[1] * op.v_c - op.v_c,
            ]),
        ),
    };

    let n = grid.len();
    let mut inductor_current = Vec::with_capacity(n);
    let mut capacitor_voltage = Vec::with_capacity(n);

    for k in 0..n {
        inductor_current.push(x[0]);
        capacitor_voltage.push(x[1]);

        if k + 1 < n {
            let mut model = OpenLoopModel {
                plant,
                params,
                duty,
                power: &power,
            };
            x = options
                .integrator
                .integrate(&mut model, grid[k], grid[k + 1], x, options.step)?;
        }
    }

    Ok(OpenLoopRun {
        time: grid,
        inductor_current,
        capacitor_voltage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_plant::{CircuitParams, LinearizedBuck, NonlinearBuck, ShiftedBuck};

    fn test_params() -> PlantParams {
        let circuit = CircuitParams::from_si(48.0, 0.11, 100.0, 4.7e-3, 1.1e-3).unwrap();
        PlantParams::new(circuit, 50.0, 24.0).unwrap()
    }

    fn options() -> OpenLoopOptions {
        OpenLoopOptions {
            end_time: 1e-3,
            step: 1e-5,
            x0_factor: [1.0, 1.0],
            ..OpenLoopOptions::default()
        }
    }

    #[test]
    fn nonlinear_stays_at_operating_point() {
        let params = test_params();
        let run = run_open_loop(&NonlinearBuck, &params, None, Frame::Absolute, &options())
            .unwrap();

        // Started exactly at equilibrium with nominal inputs: nothing moves.
        for (&i_l, &v_c) in run.inductor_current.iter().zip(&run.capacitor_voltage) {
            assert!((i_l - params.op.i_l).abs() < 1e-6);
            assert!((v_c - params.op.v_c).abs() < 1e-6);
        }
    }

    #[test]
    fn shifted_stays_at_zero_perturbation() {
        let params = test_params();
        let run = run_open_loop(&ShiftedBuck, &params, None, Frame::Perturbation, &options())
            .unwrap();
        for (&di, &dv) in run.inductor_current.iter().zip(&run.capacitor_voltage) {
            assert!(di.abs() < 1e-9);
            assert!(dv.abs() < 1e-9);
        }
    }

    #[test]
    fn shifted_and_linearized_agree_for_small_steps() {
        let params = test_params();
        let opts = OpenLoopOptions {
            x0_factor: [1.01, 0.99],
            ..options()
        };
        let plant_shifted =
            run_open_loop(&ShiftedBuck, &params, None, Frame::Perturbation, &opts).unwrap();
        let linearized = LinearizedBuck::new(&params);
        let plant_linear =
            run_open_loop(&linearized, &params, None, Frame::Perturbation, &opts).unwrap();

        for k in 0..plant_shifted.time.len() {
            assert!(
                (plant_shifted.capacitor_voltage[k] - plant_linear.capacitor_voltage[k]).abs()
                    < 0.05,
                "divergence at step {k}"
            );
        }
    }

    #[test]
    fn perturbation_signal_moves_the_states() {
        let params = test_params();
        let signal =
            PiecewiseSignal::new(vec![(0.0, params.op.p_cpl), (5e-4, params.op.p_cpl * 1.2)])
                .unwrap();
        let run = run_open_loop(
            &ShiftedBuck,
            &params,
            Some(signal),
            Frame::Perturbation,
            &options(),
        )
        .unwrap();

        let mid = run.capacitor_voltage[40];
        let late = run.capacitor_voltage[90];
        assert!(mid.abs() < 1e-9, "no deviation before the power step");
        assert!(late.abs() > 1e-6, "power step must perturb the voltage");
    }
}
