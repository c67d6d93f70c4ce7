//! Trade-off metrics computed from simulation runs.

/// Time at which the trajectory first enters the relative band
/// `[final·(1 − tolerance), final·(1 + tolerance)]` and remains inside
/// for the rest of the run. Strict inequalities keep the metric
/// conservative. Returns `None` when the final value is numerically zero
/// (the relative band degenerates) or the trajectory never settles.
pub fn settling_time(times: &[f64], values: &[f64], tolerance: f64) -> Option<f64> {
    if times.len() != values.len() || values.is_empty() {
        return None;
    }
    let final_val = *values.last().expect("non-empty series");
    if final_val.abs() < 1e-9 {
        return None;
    }

    let band_a = final_val * (1.0 - tolerance);
    let band_b = final_val * (1.0 + tolerance);
    let (lower, upper) = if band_a < band_b {
        (band_a, band_b)
    } else {
        (band_b, band_a)
    };

    let mut entered = false;
    let mut entry_idx = 0;
    for (i, &val) in values.iter().enumerate() {
        let in_band = val > lower && val < upper;
        if !entered && in_band {
            entered = true;
            entry_idx = i;
        } else if entered && !in_band {
            entered = false;
        }
    }

    if entered { Some(times[entry_idx]) } else { None }
}

/// Arithmetic mean of the inter-event times, excluding the leading 0.0
/// sentinel. `None` when no interval was recorded.
pub fn mean_inter_event_time(inter_event_times: &[f64]) -> Option<f64> {
    let intervals = inter_event_times.get(1..)?;
    if intervals.is_empty() {
        return None;
    }
    Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
}
