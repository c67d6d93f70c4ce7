//! Adaptive-step explicit time integration.

use nalgebra::DVector;

use crate::error::{SimError, SimResult};
use tg_core::Real;

/// Right-hand side of a continuous-time system.
///
/// Takes `&mut self` to allow models to cache intermediate results; the
/// integrator may evaluate candidate steps that are later rejected, so
/// implementations must not mutate observable state from `rhs`.
pub trait ContinuousModel {
    fn rhs(&mut self, t: Real, x: &DVector<Real>) -> SimResult<DVector<Real>>;
}

/// Runge-Kutta-Fehlberg 4(5) adaptive integrator.
///
/// Six stages; the 4th-order solution is propagated and the embedded
/// 5th-order solution provides the local error estimate. Step sizes are
/// controlled by a per-component error scale `abs_tol + rel_tol·|x|` with
/// max-norm acceptance, and are never allowed to exceed the caller's step
/// ceiling, so the discrete trigger/hold logic keyed to reporting steps is
/// evaluated consistently.
#[derive(Debug, Clone)]
pub struct AdaptiveRk45 {
    /// Absolute error tolerance
    pub abs_tol: Real,
    /// Relative error tolerance
    pub rel_tol: Real,
    /// Step-size safety factor
    pub safety: Real,
    /// Smallest allowed step as a fraction of the integration interval
    pub min_step_fraction: Real,
    /// Safety limit on internal steps per interval
    pub max_steps: usize,
}

impl Default for AdaptiveRk45 {
    fn default() -> Self {
        Self {
            abs_tol: 1e-8,
            rel_tol: 1e-6,
            safety: 0.9,
            min_step_fraction: 1e-12,
            max_steps: 100_000,
        }
    }
}

// Fehlberg tableau: stage times, stage weights, 4th-order combination and
// the truncation-error weights of the embedded pair.
const STAGE_TIMES: [Real; 6] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];

#[rustfmt::skip]
const STAGE_COEFFS: [&[Real]; 5] = [
    &[1.0 / 4.0],
    &[3.0 / 32.0, 9.0 / 32.0],
    &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0],
    &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0],
    &[-8.0 / 27.0, 2.0, -3554.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
];

const PROPAGATION: [Real; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

const TRUNCATION: [Real; 6] = [
    1.0 / 360.0,
    0.0,
    -128.0 / 4275.0,
    -2197.0 / 75240.0,
    1.0 / 50.0,
    2.0 / 55.0,
];

impl AdaptiveRk45 {
    /// Integrate `model` from `t0` to `t1` starting at `x0`.
    ///
    /// Internal steps adapt to the error estimate but never exceed
    /// `max_step` (nor the remaining interval).
    pub fn integrate<M: ContinuousModel>(
        &self,
        model: &mut M,
        t0: Real,
        t1: Real,
        x0: DVector<Real>,
        max_step: Real,
    ) -> SimResult<DVector<Real>> {
        if !(t1 > t0) {
            return Err(SimError::InvalidArg {
                what: "integration interval must have positive length",
            });
        }
        if !(max_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "step ceiling must be positive",
            });
        }

        let span = t1 - t0;
        let min_step = self.min_step_fraction * span;
        let n = x0.len();

        let mut t = t0;
        let mut x = x0;
        let mut h = max_step.min(span);

        for _ in 0..self.max_steps {
            if t >= t1 - min_step {
                return Ok(x);
            }
            h = h.min(t1 - t).min(max_step);

            let mut slopes: Vec<DVector<Real>> = Vec::with_capacity(6);
            slopes.push(model.rhs(t, &x)?);
            for (stage, coeffs) in STAGE_COEFFS.iter().enumerate() {
                let mut probe = x.clone();
                for (slope, &coeff) in slopes.iter().zip(coeffs.iter()) {
                    probe += slope * (coeff * h);
                }
                slopes.push(model.rhs(t + STAGE_TIMES[stage + 1] * h, &probe)?);
            }

            let mut error_slope = DVector::zeros(n);
            let mut proposal = x.clone();
            for (i, slope) in slopes.iter().enumerate() {
                error_slope += slope * TRUNCATION[i];
                proposal += slope * (PROPAGATION[i] * h);
            }

            let mut error_norm: Real = 0.0;
            for i in 0..n {
                let scale = self.abs_tol + self.rel_tol * x[i].abs();
                error_norm = error_norm.max((h * error_slope[i] / scale).abs());
            }
            let error_norm = error_norm.max(1e-16);

            if error_norm <= 1.0 {
                t += h;
                x = proposal;
            }

            let growth = (self.safety / error_norm.powf(0.2)).clamp(0.1, 10.0);
            h *= growth;
            if error_norm > 1.0 && h < min_step {
                return Err(SimError::ConvergenceFailed {
                    what: format!("step size underflow at t = {t:.6e}"),
                });
            }
        }

        Err(SimError::ConvergenceFailed {
            what: format!("internal step limit reached at t = {t:.6e}"),
        })
    }
}
