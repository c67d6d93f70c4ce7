//! Event-trigger policies.
//!
//! A policy watches the plant state and the currently held transmitted
//! state and decides, at every accepted simulation instant, whether to
//! re-transmit. The decision is based on the quadratic trigger function
//!
//! ```text
//! Γ(x, x̂) = xᵗ·Ψ·x − eᵗ·Ξ·e,   e = x̂ − x
//! ```
//!
//! with a transmission whenever Γ < 0 (and always at t = 0).

use nalgebra::{Matrix2, Vector2};

use crate::error::{ControlError, ControlResult};
use tg_core::Real;

/// Quadratic trigger condition parameterized by Ψ and Ξ.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerCondition {
    psi: Matrix2<Real>,
    xi: Matrix2<Real>,
}

impl TriggerCondition {
    pub fn new(psi: Matrix2<Real>, xi: Matrix2<Real>) -> ControlResult<Self> {
        if psi.iter().any(|e| !e.is_finite()) || xi.iter().any(|e| !e.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "trigger matrices must be finite",
            });
        }
        Ok(Self { psi, xi })
    }

    /// Evaluate Γ at the current state and the held transmitted state.
    ///
    /// With zero transmission error (x̂ == x) this reduces to xᵗ·Ψ·x.
    pub fn gamma(&self, current: &Vector2<Real>, last_sent: &Vector2<Real>) -> Real {
        let error = last_sent - current;
        current.dot(&(self.psi * current)) - error.dot(&(self.xi * error))
    }
}

/// Mutable per-run state shared by both policy variants.
#[derive(Debug, Clone)]
struct PolicyState {
    last_time: Real,
    first_pass: bool,
    event_times: Vec<Real>,
}

impl PolicyState {
    fn new() -> Self {
        Self {
            last_time: 0.0,
            first_pass: true,
            event_times: vec![0.0],
        }
    }

    /// Record a firing, keeping the log strictly increasing. Only the
    /// first monotone pass over time logs events; once time is observed
    /// to move backwards the log is frozen.
    fn observe(&mut self, t: Real, fired: bool) {
        if t < self.last_time {
            self.first_pass = false;
        }
        self.last_time = t;

        if fired && self.first_pass {
            let last = *self
                .event_times
                .last()
                .expect("event log always holds its leading zero");
            if t > last {
                self.event_times.push(t);
            }
        }
    }
}

/// A trigger policy with per-run internal state.
pub trait TriggerPolicy {
    /// Number of auxiliary continuous states integrated with the plant.
    fn aux_dim(&self) -> usize {
        0
    }

    /// Reset all mutable per-run state to its initial values.
    fn reset(&mut self);

    /// Transmission decision at an accepted instant `t`: returns the state
    /// seen by the communication channel (the current state on a trigger
    /// or at t = 0, the held state otherwise) and records the event.
    fn decide(&mut self, t: Real, current: &Vector2<Real>, held: &Vector2<Real>)
    -> Vector2<Real>;

    /// Time derivative of the auxiliary state; zero for policies without
    /// internal dynamics.
    fn aux_derivative(&self, _aux: Real, _current: &Vector2<Real>, _held: &Vector2<Real>) -> Real {
        0.0
    }

    /// Event-time log: starts at 0.0, strictly increasing.
    fn event_times(&self) -> &[Real];
}

/// Static event-trigger policy: the trigger inequality alone decides.
#[derive(Debug, Clone)]
pub struct StaticPolicy {
    condition: TriggerCondition,
    state: PolicyState,
}

impl StaticPolicy {
    pub fn new(condition: TriggerCondition) -> Self {
        Self {
            condition,
            state: PolicyState::new(),
        }
    }

    pub fn condition(&self) -> &TriggerCondition {
        &self.condition
    }
}

impl TriggerPolicy for StaticPolicy {
    fn reset(&mut self) {
        self.state = PolicyState::new();
    }

    fn decide(
        &mut self,
        t: Real,
        current: &Vector2<Real>,
        held: &Vector2<Real>,
    ) -> Vector2<Real> {
        let gamma = self.condition.gamma(current, held);
        let fired = gamma < 0.0;
        self.state.observe(t, fired);

        if fired || t == 0.0 { *current } else { *held }
    }

    fn event_times(&self) -> &[Real] {
        &self.state.event_times
    }
}

/// Dynamic event-trigger policy.
///
/// Adds a first-order auxiliary scalar `n` with
/// dn/dt = −λ·n + Γ(x, x̂), exposed as an extra observable channel. The
/// threshold parameter θ is carried with the policy but not consulted by
/// the trigger rule.
#[derive(Debug, Clone)]
pub struct DynamicPolicy {
    condition: TriggerCondition,
    theta: Real,
    decay: Real,
    state: PolicyState,
}

impl DynamicPolicy {
    /// Default threshold parameter θ.
    pub const DEFAULT_THETA: Real = 1.0;
    /// Default decay rate λ.
    pub const DEFAULT_DECAY: Real = 100.0;

    pub fn new(condition: TriggerCondition, theta: Real, decay: Real) -> Self {
        Self {
            condition,
            theta,
            decay,
            state: PolicyState::new(),
        }
    }

    pub fn with_defaults(condition: TriggerCondition) -> Self {
        Self::new(condition, Self::DEFAULT_THETA, Self::DEFAULT_DECAY)
    }

    pub fn condition(&self) -> &TriggerCondition {
        &self.condition
    }

    pub fn theta(&self) -> Real {
        self.theta
    }

    pub fn decay(&self) -> Real {
        self.decay
    }
}

impl TriggerPolicy for DynamicPolicy {
    fn aux_dim(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.state = PolicyState::new();
    }

    fn decide(
        &mut self,
        t: Real,
        current: &Vector2<Real>,
        held: &Vector2<Real>,
    ) -> Vector2<Real> {
        let gamma = self.condition.gamma(current, held);
        let fired = gamma < 0.0;
        self.state.observe(t, fired);

        if fired || t == 0.0 { *current } else { *held }
    }

    fn aux_derivative(&self, aux: Real, current: &Vector2<Real>, held: &Vector2<Real>) -> Real {
        -self.decay * aux + self.condition.gamma(current, held)
    }

    fn event_times(&self) -> &[Real] {
        &self.state.event_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_condition() -> TriggerCondition {
        TriggerCondition::new(
            Matrix2::new(2.0, 0.5, 0.5, 1.0),
            Matrix2::new(3.0, -0.25, -0.25, 4.0),
        )
        .unwrap()
    }

    #[test]
    fn gamma_with_zero_error_is_state_quadratic() {
        let condition = test_condition();
        let x = Vector2::new(1.5, -2.0);
        let expected = x.dot(&(Matrix2::new(2.0, 0.5, 0.5, 1.0) * x));
        assert!((condition.gamma(&x, &x) - expected).abs() < 1e-12);
    }

    #[test]
    fn non_finite_matrices_are_rejected() {
        let bad = Matrix2::new(f64::NAN, 0.0, 0.0, 1.0);
        assert!(TriggerCondition::new(bad, Matrix2::identity()).is_err());
    }

    #[test]
    fn always_transmits_at_time_zero() {
        let mut policy = StaticPolicy::new(
            // Huge Ξ suppresses the trigger even for a large error.
            TriggerCondition::new(Matrix2::identity(), Matrix2::identity() * 1e12).unwrap(),
        );
        let current = Vector2::new(1.0, 1.0);
        let held = Vector2::new(5.0, -5.0);
        assert_eq!(policy.decide(0.0, &current, &held), current);
    }

    #[test]
    fn holds_when_trigger_is_quiet() {
        let mut policy = StaticPolicy::new(test_condition());
        let x = Vector2::new(1.0, 1.0);
        // Zero error: Γ = xᵗΨx > 0, no trigger.
        let sent = policy.decide(1e-5, &x, &x);
        assert_eq!(sent, x);
        assert_eq!(policy.event_times(), &[0.0]);
    }

    #[test]
    fn event_log_is_strictly_increasing() {
        let mut policy = StaticPolicy::new(
            // Tiny Ψ, large Ξ error weight: fires for any real error.
            TriggerCondition::new(Matrix2::identity() * 1e-12, Matrix2::identity() * 1e6)
                .unwrap(),
        );
        let current = Vector2::new(1.0, 0.0);
        let held = Vector2::new(0.5, 0.0);

        policy.decide(0.0, &current, &held);
        policy.decide(1e-5, &current, &held);
        policy.decide(1e-5, &current, &held); // revisit of the same instant
        policy.decide(2e-5, &current, &held);

        let events = policy.event_times();
        assert_eq!(events, &[0.0, 1e-5, 2e-5]);
        for pair in events.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn backwards_time_freezes_the_log() {
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity() * 1e-12, Matrix2::identity() * 1e6)
                .unwrap(),
        );
        let current = Vector2::new(1.0, 0.0);
        let held = Vector2::new(0.5, 0.0);

        policy.decide(0.0, &current, &held);
        policy.decide(2e-5, &current, &held);
        policy.decide(1e-5, &current, &held); // out-of-order probe
        policy.decide(3e-5, &current, &held);

        assert_eq!(policy.event_times(), &[0.0, 2e-5]);
    }

    #[test]
    fn reset_clears_run_state() {
        let mut policy = StaticPolicy::new(
            TriggerCondition::new(Matrix2::identity() * 1e-12, Matrix2::identity() * 1e6)
                .unwrap(),
        );
        let current = Vector2::new(1.0, 0.0);
        let held = Vector2::new(0.5, 0.0);
        policy.decide(0.0, &current, &held);
        policy.decide(1e-5, &current, &held);
        assert!(policy.event_times().len() > 1);

        policy.reset();
        assert_eq!(policy.event_times(), &[0.0]);
    }

    #[test]
    fn dynamic_aux_derivative_matches_formula() {
        let policy = DynamicPolicy::new(test_condition(), 1.0, 100.0);
        let current = Vector2::new(0.4, -0.1);
        let held = Vector2::new(0.5, 0.0);
        let gamma = policy.condition().gamma(&current, &held);
        let n = 0.25;
        assert!((policy.aux_derivative(n, &current, &held) - (-100.0 * n + gamma)).abs() < 1e-12);
    }

    #[test]
    fn dynamic_carries_theta_without_consulting_it() {
        let condition = test_condition();
        let mut with_theta = DynamicPolicy::new(condition.clone(), 1.0, 100.0);
        let mut other_theta = DynamicPolicy::new(condition, 42.0, 100.0);

        let current = Vector2::new(1.0, -0.5);
        let held = Vector2::new(0.2, 0.1);
        let sent_a = with_theta.decide(1e-5, &current, &held);
        let sent_b = other_theta.decide(1e-5, &current, &held);

        assert_eq!(sent_a, sent_b);
        assert_eq!(with_theta.event_times(), other_theta.event_times());
        assert_eq!(other_theta.theta(), 42.0);
    }

    proptest! {
        #[test]
        fn decision_output_is_current_or_held(
            x1 in -10.0f64..10.0, x2 in -10.0f64..10.0,
            h1 in -10.0f64..10.0, h2 in -10.0f64..10.0,
            t in 0.0f64..1.0,
        ) {
            let mut policy = StaticPolicy::new(test_condition());
            let current = Vector2::new(x1, x2);
            let held = Vector2::new(h1, h2);
            let sent = policy.decide(t, &current, &held);
            prop_assert!(sent == current || sent == held);
        }
    }
}
