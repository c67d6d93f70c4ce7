//! Piecewise-constant time signals.
//!
//! Perturbation inputs (e.g. the constant-power-load demand) are square
//! signals given as ordered (switch-time, value) breakpoints.

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Piecewise-constant signal defined by ordered (switch-time, value) pairs.
///
/// The value at time `t` is the value of the last breakpoint whose
/// switch-time is `<= t`. Before the first breakpoint the first value
/// applies; past the last breakpoint the last value applies.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseSignal {
    breakpoints: Vec<(Real, Real)>,
}

impl PiecewiseSignal {
    /// Create a signal from breakpoints.
    ///
    /// Breakpoints must be non-empty, finite, and strictly increasing in time.
    pub fn new(breakpoints: Vec<(Real, Real)>) -> CoreResult<Self> {
        if breakpoints.is_empty() {
            return Err(CoreError::InvalidArg {
                what: "signal needs at least one breakpoint",
            });
        }
        for &(t, v) in &breakpoints {
            if !t.is_finite() {
                return Err(CoreError::NonFinite {
                    what: "breakpoint time",
                    value: t,
                });
            }
            if !v.is_finite() {
                return Err(CoreError::NonFinite {
                    what: "breakpoint value",
                    value: v,
                });
            }
        }
        for pair in breakpoints.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(CoreError::InvalidArg {
                    what: "breakpoint times must be strictly increasing",
                });
            }
        }
        Ok(Self { breakpoints })
    }

    /// A signal holding one value for all time.
    pub fn constant(value: Real) -> Self {
        Self {
            breakpoints: vec![(0.0, value)],
        }
    }

    /// Evaluate the signal at time `t`.
    pub fn value_at(&self, t: Real) -> Real {
        let mut value = self.breakpoints[0].1;
        for &(switch_time, v) in &self.breakpoints {
            if switch_time <= t {
                value = v;
            } else {
                break;
            }
        }
        value
    }

    /// Sample the signal over a time grid.
    pub fn sample(&self, times: &[Real]) -> Vec<Real> {
        times.iter().map(|&t| self.value_at(t)).collect()
    }

    /// The same signal with `offset` subtracted from every value.
    ///
    /// Used to turn an absolute power demand into a perturbation around an
    /// operating value.
    pub fn shifted(&self, offset: Real) -> Self {
        Self {
            breakpoints: self
                .breakpoints
                .iter()
                .map(|&(t, v)| (t, v - offset))
                .collect(),
        }
    }

    pub fn breakpoints(&self) -> &[(Real, Real)] {
        &self.breakpoints
    }
}

/// Sample a square signal defined by `breakpoints` over `times`.
pub fn generate_square_signal(times: &[Real], breakpoints: &[(Real, Real)]) -> CoreResult<Vec<Real>> {
    let signal = PiecewiseSignal::new(breakpoints.to_vec())?;
    Ok(signal.sample(times))
}
