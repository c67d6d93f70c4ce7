//! Closed-loop composer and runner.
//!
//! Wires a plant variant, a trigger policy, the transmission hold and the
//! state-feedback controller into one coupled hybrid system:
//!
//! ```text
//! plant state ──► trigger policy ──► hold ──► controller ──► plant input
//!                      ▲               │
//!                      └── held state ─┘
//! ```
//!
//! The loop is algebraic but free of an instantaneous cycle: the hold
//! promotes its buffer only at reporting-step boundaries, so the trigger
//! decision at step k compares against the state transmitted at step k−1,
//! and the duty command is constant over each reporting interval. The
//! continuous dynamics (plant states plus the dynamic policy's auxiliary
//! state) are integrated between boundaries with the adaptive integrator,
//! whose step ceiling equals the reporting step.

use nalgebra::{DVector, Vector2};

use crate::error::SimResult;
use crate::integrator::{AdaptiveRk45, ContinuousModel};
use crate::run::{SimulationRun, inter_event_times, time_grid};
use tg_controls::{StateFeedback, TransmissionHold, TriggerPolicy};
use tg_core::{PiecewiseSignal, Real};
use tg_plant::{PlantInput, PlantModel, PlantParams};

/// Options for closed-loop runs.
#[derive(Debug, Clone)]
pub struct ClosedLoopOptions {
    /// Final simulation time (seconds)
    pub end_time: Real,
    /// Reporting step Δt (seconds); also the integrator's step ceiling
    pub step: Real,
    /// Initial-state scaling factors for (inductor current, capacitor voltage)
    pub x0_factor: [Real; 2],
    /// Continuous-dynamics integrator
    pub integrator: AdaptiveRk45,
}

impl Default for ClosedLoopOptions {
    fn default() -> Self {
        Self {
            end_time: 0.1,
            step: 1e-5,
            x0_factor: [1.5, 0.13],
            integrator: AdaptiveRk45::default(),
        }
    }
}

/// Closed-loop simulation of one plant variant under one trigger policy.
///
/// Owns the freshly-reset hold state; the policy is borrowed exclusively
/// so no per-run state can leak across simulations.
pub struct ClosedLoopSim<'a, P: PlantModel, T: TriggerPolicy> {
    plant: &'a P,
    params: &'a PlantParams,
    policy: &'a mut T,
    feedback: StateFeedback,
    perturbation: PiecewiseSignal,
    hold: TransmissionHold,
}

impl<'a, P: PlantModel, T: TriggerPolicy> ClosedLoopSim<'a, P, T> {
    /// Compose the loop. `perturbation` is the absolute power demand; when
    /// absent the load stays at its operating value.
    pub fn new(
        plant: &'a P,
        params: &'a PlantParams,
        policy: &'a mut T,
        feedback: StateFeedback,
        perturbation: Option<PiecewiseSignal>,
    ) -> Self {
        let perturbation =
            perturbation.unwrap_or_else(|| PiecewiseSignal::constant(params.op.p_cpl));
        Self {
            plant,
            params,
            policy,
            feedback,
            perturbation,
            hold: TransmissionHold::new(),
        }
    }

    /// Run the closed loop over the reporting grid.
    ///
    /// States are integrated in perturbation coordinates; the initial
    /// state is `x0_factor` times the operating point, shifted.
    pub fn run(&mut self, options: &ClosedLoopOptions) -> SimResult<SimulationRun> {
        let grid = time_grid(options.end_time, options.step)?;
        self.policy.reset();
        self.hold.reset();

        let op = self.params.op;
        let aux = self.policy.aux_dim() > 0;
        let dim = 2 + self.policy.aux_dim();
        let shifted = self.perturbation.shifted(op.p_cpl);

        let mut x = DVector::zeros(dim);
        x[0] = options.x0_factor[0] * op.i_l - op.i_l;
        x[1] = options.x0_factor[1] * op.v_c - op.v_c;

        let n = grid.len();
        let mut inductor_current = Vec::with_capacity(n);
        let mut capacitor_voltage = Vec::with_capacity(n);
        let mut duty_series = Vec::with_capacity(n);
        let mut aux_series = aux.then(|| Vec::with_capacity(n));

        for k in 0..n {
            let t = grid[k];
            let current = Vector2::new(x[0], x[1]);
            let held = self.hold.sample(t);
            let sent = self.policy.decide(t, &current, &held);
            self.hold.record(sent);
            let duty = self.feedback.command(&held);

            inductor_current.push(x[0]);
            capacitor_voltage.push(x[1]);
            duty_series.push(duty);
            if let Some(series) = aux_series.as_mut() {
                series.push(x[2]);
            }

            if k + 1 < n {
                let mut interval = IntervalModel {
                    plant: self.plant,
                    params: self.params,
                    policy: &*self.policy,
                    perturbation: &shifted,
                    duty,
                    held,
                    aux,
                };
                x = options
                    .integrator
                    .integrate(&mut interval, t, grid[k + 1], x, options.step)?;
            }
        }

        let event_times = self.policy.event_times().to_vec();
        let inter_event = inter_event_times(&event_times);
        tracing::debug!(
            steps = n,
            events = event_times.len(),
            "closed-loop run complete"
        );

        Ok(SimulationRun {
            time: grid,
            inductor_current,
            capacitor_voltage,
            duty: duty_series,
            aux: aux_series,
            event_times,
            inter_event_times: inter_event,
        })
    }
}

/// Continuous dynamics over one reporting interval: the held state and
/// duty command are algebraic constants; only the perturbation input
/// varies with time.
struct IntervalModel<'m, P: PlantModel, T: TriggerPolicy> {
    plant: &'m P,
    params: &'m PlantParams,
    policy: &'m T,
    perturbation: &'m PiecewiseSignal,
    duty: Real,
    held: Vector2<Real>,
    aux: bool,
}

impl<'m, P: PlantModel, T: TriggerPolicy> ContinuousModel for IntervalModel<'m, P, T> {
    fn rhs(&mut self, t: Real, x: &DVector<Real>) -> SimResult<DVector<Real>> {
        let state = Vector2::new(x[0], x[1]);
        let input = PlantInput {
            duty: self.duty,
            p_cpl: self.perturbation.value_at(t),
        };
        let dx = self.plant.derivative(t, &state, &input, self.params)?;

        let mut out = DVector::zeros(x.len());
        out[0] = dx[0];
        out[1] = dx[1];
        if self.aux {
            out[2] = self.policy.aux_derivative(x[2], &state, &self.held);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, RowVector2};
    use tg_controls::{DynamicPolicy, StaticPolicy, TriggerCondition};
    use tg_plant::{CircuitParams, LinearizedBuck};

    fn test_params() -> PlantParams {
        let circuit = CircuitParams::from_si(48.0, 0.11, 100.0, 4.7e-3, 1.1e-3).unwrap();
        PlantParams::new(circuit, 50.0, 24.0).unwrap()
    }

    fn test_gain() -> StateFeedback {
        StateFeedback::new(RowVector2::new(-0.05, -0.02)).unwrap()
    }

    fn short_options() -> ClosedLoopOptions {
        ClosedLoopOptions {
            end_time: 1e-3,
            step: 1e-5,
            ..ClosedLoopOptions::default()
        }
    }

    #[test]
    fn run_satisfies_event_invariants() {
        let params = test_params();
        let plant = LinearizedBuck::new(&params);
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity(), Matrix2::identity()).unwrap(),
        );
        let mut sim = ClosedLoopSim::new(&plant, &params, &mut policy, test_gain(), None);
        let run = sim.run(&short_options()).unwrap();

        assert_eq!(run.time.len(), 101);
        assert_eq!(run.inductor_current.len(), run.time.len());
        assert_eq!(run.capacitor_voltage.len(), run.time.len());
        assert_eq!(run.duty.len(), run.time.len());
        assert!(run.aux.is_none());

        assert_eq!(run.event_times[0], 0.0);
        for pair in run.event_times.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert_eq!(run.inter_event_times.len(), run.event_times.len());
        assert_eq!(run.inter_event_times[0], 0.0);
        for i in 1..run.event_times.len() {
            let diff = run.event_times[i] - run.event_times[i - 1];
            assert!((run.inter_event_times[i] - diff).abs() < 1e-15);
        }
    }

    #[test]
    fn initial_state_is_scaled_operating_point() {
        let params = test_params();
        let plant = LinearizedBuck::new(&params);
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity(), Matrix2::identity()).unwrap(),
        );
        let mut sim = ClosedLoopSim::new(&plant, &params, &mut policy, test_gain(), None);
        let run = sim.run(&short_options()).unwrap();

        let op = params.op;
        assert!((run.inductor_current[0] - (1.5 * op.i_l - op.i_l)).abs() < 1e-12);
        assert!((run.capacitor_voltage[0] - (0.13 * op.v_c - op.v_c)).abs() < 1e-12);
        // The held estimate starts at the origin, so the first command is zero.
        assert_eq!(run.duty[0], 0.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let params = test_params();
        let plant = LinearizedBuck::new(&params);
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity(), Matrix2::identity()).unwrap(),
        );
        let mut sim = ClosedLoopSim::new(&plant, &params, &mut policy, test_gain(), None);
        let first = sim.run(&short_options()).unwrap();
        let second = sim.run(&short_options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn dynamic_policy_exposes_aux_series() {
        let params = test_params();
        let plant = LinearizedBuck::new(&params);
        let mut policy = DynamicPolicy::with_defaults(
            TriggerCondition::new(Matrix2::identity(), Matrix2::identity()).unwrap(),
        );
        let mut sim = ClosedLoopSim::new(&plant, &params, &mut policy, test_gain(), None);
        let run = sim.run(&short_options()).unwrap();

        let aux = run.aux.expect("dynamic policy must expose its aux series");
        assert_eq!(aux.len(), run.time.len());
        assert_eq!(aux[0], 0.0);
        assert!(aux.iter().all(|v| v.is_finite()));
    }

    /// With a trigger that fires on any transmission error, the loop
    /// reduces to continuous state feedback through the one-step hold
    /// delay: u_k = K·x_{k−1}.
    #[test]
    fn always_firing_trigger_matches_direct_delayed_feedback() {
        let params = test_params();
        let plant = LinearizedBuck::new(&params);
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity() * 1e-12, Matrix2::identity() * 1e12)
                .unwrap(),
        );
        let gain = test_gain();
        let options = short_options();

        let mut sim = ClosedLoopSim::new(&plant, &params, &mut policy, gain.clone(), None);
        let run = sim.run(&options).unwrap();

        // Every reporting step transmits.
        assert_eq!(run.event_times.len(), run.time.len());

        // Reference: direct delayed feedback over the same grid.
        struct DelayedFeedback<'m> {
            plant: &'m LinearizedBuck,
            params: &'m PlantParams,
            duty: Real,
        }
        impl<'m> ContinuousModel for DelayedFeedback<'m> {
            fn rhs(&mut self, t: Real, x: &DVector<Real>) -> SimResult<DVector<Real>> {
                let state = Vector2::new(x[0], x[1]);
                let input = PlantInput {
                    duty: self.duty,
                    p_cpl: 0.0,
                };
                let dx = self.plant.derivative(t, &state, &input, self.params)?;
                Ok(DVector::from_vec(vec![dx[0], dx[1]]))
            }
        }

        let grid = time_grid(options.end_time, options.step).unwrap();
        let op = params.op;
        let mut x = DVector::from_vec(vec![
            options.x0_factor[0] * op.i_l - op.i_l,
            options.x0_factor[1] * op.v_c - op.v_c,
        ]);
        let mut held = Vector2::zeros();
        for k in 0..grid.len() {
            let expected_duty = gain.command(&held);
            assert!(
                (run.duty[k] - expected_duty).abs() < 1e-9,
                "duty mismatch at step {k}"
            );
            assert!((run.inductor_current[k] - x[0]).abs() < 1e-9);
            assert!((run.capacitor_voltage[k] - x[1]).abs() < 1e-9);

            held = Vector2::new(x[0], x[1]);
            if k + 1 < grid.len() {
                let mut reference = DelayedFeedback {
                    plant: &plant,
                    params: &params,
                    duty: expected_duty,
                };
                x = options
                    .integrator
                    .integrate(&mut reference, grid[k], grid[k + 1], x, options.step)
                    .unwrap();
            }
        }
    }
}
