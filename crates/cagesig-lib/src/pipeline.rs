//! End-to-end conditioning runs built from the detectors and metrics.

use crate::{
    config::{ConditioningConfig, ObservationConfig},
    detectors::{
        artifacts::{interpolate_rejected, median_despike, rejected_cumsum},
        runs::{stable_sequences, unstable_sequences},
        spikes::{detect_positive_spikes_with_config, smooth_spikes},
    },
    error::{Result, SignalError},
    metrics::features::discretize_observations,
    signal::{Events, Span, TimedSeries},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Cleaned weight trace plus the runs found in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConditioningResult {
    pub sample_count: usize,
    /// Every spike found in the raw trace.
    pub spikes: Events,
    /// Spikes that had enough context on both sides to be smoothed.
    pub smoothed_spikes: Events,
    pub smoothed: Vec<f64>,
    pub stable_runs: Vec<Span>,
    pub unstable_runs: Vec<Span>,
}

/// Detect and smooth positive spikes, then segment the cleaned trace.
///
/// Spikes too close to either end for the configured windows are reported
/// but left in place.
pub fn condition_weight_trace(
    series: &TimedSeries,
    cfg: &ConditioningConfig,
) -> Result<WeightConditioningResult> {
    cfg.spikes.validate()?;
    cfg.runs.validate()?;
    let spikes = detect_positive_spikes_with_config(&series.data, &series.times, &cfg.spikes)?;
    let n = series.len();
    let backward = cfg.spikes.backward_window;
    let forward = cfg.spikes.forward_window;
    let (usable, skipped): (Vec<usize>, Vec<usize>) = spikes
        .indices
        .iter()
        .partition(|&&i| i >= backward && i + forward <= n);
    if !skipped.is_empty() {
        warn!(
            "{} spike(s) too close to the trace edges to smooth: {:?}",
            skipped.len(),
            skipped
        );
    }
    let smoothed = smooth_spikes(&series.data, &usable, backward, forward)?;
    let runs = &cfg.runs;
    let stable_runs = stable_sequences(&smoothed, runs.stable_diff, runs.stable_duration)?;
    let unstable_runs =
        unstable_sequences(&smoothed, runs.u_diff, runs.s_diff, runs.unstable_duration)?;
    debug!(
        "conditioned {} samples: {} spikes, {} stable runs, {} unstable runs",
        n,
        spikes.len(),
        stable_runs.len(),
        unstable_runs.len()
    );
    Ok(WeightConditioningResult {
        sample_count: n,
        spikes,
        smoothed_spikes: Events::from_indices(usable),
        smoothed,
        stable_runs,
        unstable_runs,
    })
}

/// Per-interval changes of a hopper trace, ready for a discrete classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopperObservations {
    /// Change in despiked weight over each sampling interval.
    pub weight_deltas: Vec<f64>,
    /// Rejected (disturbed) samples within each sampling interval.
    pub disturbance_deltas: Vec<f64>,
    /// Flattened grid cell of each `(weight, disturbance)` pair.
    pub codes: Vec<usize>,
}

/// Despike a hopper trace, thin it, and discretise the interval changes.
///
/// The first interval is dropped: it carries the initial fill of the hopper
/// rather than consumption.
pub fn hopper_observations(data: &[f64], cfg: &ObservationConfig) -> Result<HopperObservations> {
    cfg.validate()?;
    let despiked = median_despike(data, cfg.time_radius, cfg.amplitude_radius, cfg.tolerance)?;
    let weight = interpolate_rejected(&despiked)?;
    let disturbances = rejected_cumsum(&despiked);

    let step = cfg.sampling_interval;
    let thinned_weight: Vec<f64> = weight.iter().step_by(step).copied().collect();
    let thinned_disturbances: Vec<f64> = disturbances
        .iter()
        .step_by(step)
        .map(|&c| c as f64)
        .collect();
    if thinned_weight.len() < 3 {
        return Err(SignalError::insufficient(format!(
            "{} samples at interval {step} give fewer than two usable intervals",
            data.len()
        )));
    }
    let weight_deltas = deltas(&thinned_weight);
    let disturbance_deltas = deltas(&thinned_disturbances);
    let codes = discretize_observations(&weight_deltas, &disturbance_deltas, cfg.bins)?;
    debug!(
        "hopper observations: {} intervals from {} samples",
        codes.len(),
        data.len()
    );
    Ok(HopperObservations {
        weight_deltas,
        disturbance_deltas,
        codes,
    })
}

fn deltas(values: &[f64]) -> Vec<f64> {
    values.windows(2).skip(1).map(|w| w[1] - w[0]).collect()
}
