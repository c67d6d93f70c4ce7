//! Simulation run records and event statistics.

use crate::error::{SimError, SimResult};
use tg_core::Real;

/// Recorded closed-loop simulation run.
///
/// All series share the reporting time grid. States are in the
/// coordinates of the simulated plant variant (perturbations around the
/// operating point for the shifted and linearized plants).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    /// Uniform reporting grid.
    pub time: Vec<Real>,
    /// Inductor-current state series.
    pub inductor_current: Vec<Real>,
    /// Capacitor-voltage state series.
    pub capacitor_voltage: Vec<Real>,
    /// Duty-cycle command series.
    pub duty: Vec<Real>,
    /// Auxiliary dynamic-trigger series (dynamic policies only).
    pub aux: Option<Vec<Real>>,
    /// Trigger event instants: starts at 0.0, strictly increasing.
    pub event_times: Vec<Real>,
    /// Inter-event times with a leading 0.0 sentinel.
    pub inter_event_times: Vec<Real>,
}

/// Build the inter-event-time series from the event log.
///
/// Element 0 is a 0.0 sentinel keeping the series aligned with the event
/// instants; element i ≥ 1 is `events[i] − events[i−1]`.
pub fn inter_event_times(event_times: &[Real]) -> Vec<Real> {
    let mut iet = Vec::with_capacity(event_times.len());
    iet.push(0.0);
    for pair in event_times.windows(2) {
        iet.push(pair[1] - pair[0]);
    }
    iet
}

/// Build the uniform reporting grid covering [0, end_time] with step `step`.
pub fn time_grid(end_time: Real, step: Real) -> SimResult<Vec<Real>> {
    if !(step > 0.0) {
        return Err(SimError::InvalidArg {
            what: "step must be positive",
        });
    }
    if !(end_time > 0.0) {
        return Err(SimError::InvalidArg {
            what: "end time must be positive",
        });
    }
    let n = (end_time / step).round() as usize;
    if n == 0 {
        return Err(SimError::InvalidArg {
            what: "end time must cover at least one step",
        });
    }
    Ok((0..=n).map(|k| k as Real * step).collect())
}
