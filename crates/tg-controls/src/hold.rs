//! Transmission zero-order hold.

use nalgebra::Vector2;

use tg_core::Real;

/// Zero-order hold over the transmitted state.
///
/// The hold promotes its buffered input to the output only when the
/// sampling time changes, so the output at a given step is the value
/// recorded at the *previous* distinct step (a one-step-delayed hold).
/// Repeated samples at the same instant are idempotent, which keeps the
/// hold well defined against integrators that revisit a time.
///
/// Because the output depends only on the hold's own history, sampling it
/// before the trigger decision breaks the algebraic feedback cycle of the
/// closed loop.
#[derive(Debug, Clone)]
pub struct TransmissionHold {
    last_time: Real,
    buffered: Option<Vector2<Real>>,
    held: Vector2<Real>,
}

impl TransmissionHold {
    pub fn new() -> Self {
        Self {
            last_time: 0.0,
            buffered: None,
            held: Vector2::zeros(),
        }
    }

    /// Reset to the initial state (output (0, 0), empty buffer).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Sample the hold at time `t`, promoting the buffered value if the
    /// time has advanced since the last sample.
    pub fn sample(&mut self, t: Real) -> Vector2<Real> {
        if t != self.last_time {
            if let Some(buffered) = self.buffered {
                self.held = buffered;
            }
            self.last_time = t;
        }
        self.held
    }

    /// Record the latest transmitted value for the next promotion.
    pub fn record(&mut self, value: Vector2<Real>) {
        self.buffered = Some(value);
    }

    /// The currently held output without sampling.
    pub fn held(&self) -> Vector2<Real> {
        self.held
    }
}

impl Default for TransmissionHold {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_output_is_zero() {
        let mut hold = TransmissionHold::new();
        assert_eq!(hold.sample(0.0), Vector2::zeros());
    }

    #[test]
    fn output_is_delayed_by_one_step() {
        let mut hold = TransmissionHold::new();

        assert_eq!(hold.sample(0.0), Vector2::zeros());
        hold.record(Vector2::new(1.0, 2.0));

        // The value recorded at t=0 appears once time advances.
        assert_eq!(hold.sample(1e-5), Vector2::new(1.0, 2.0));
        hold.record(Vector2::new(3.0, 4.0));

        assert_eq!(hold.sample(2e-5), Vector2::new(3.0, 4.0));
    }

    #[test]
    fn sampling_is_idempotent_at_a_fixed_time() {
        let mut hold = TransmissionHold::new();
        hold.sample(0.0);
        hold.record(Vector2::new(1.0, 2.0));
        hold.sample(1e-5);
        hold.record(Vector2::new(9.0, 9.0));

        let first = hold.sample(1e-5);
        let second = hold.sample(1e-5);
        let third = hold.sample(1e-5);
        assert_eq!(first, Vector2::new(1.0, 2.0));
        assert_eq!(second, first);
        assert_eq!(third, first);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut hold = TransmissionHold::new();
        hold.record(Vector2::new(1.0, 1.0));
        hold.sample(1e-5);
        hold.reset();
        assert_eq!(hold.sample(0.0), Vector2::zeros());
        assert_eq!(hold.sample(1e-5), Vector2::zeros());
    }
}
