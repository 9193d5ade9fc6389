use crate::{
    detectors::{runs::DEFAULT_STABILITY_DURATION, spikes::SpikeConfig},
    error::{ensure_non_negative, ensure_positive, Result as SignalResult},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Tolerances for the run scanners applied to a conditioned trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Largest step between samples that still counts as stable.
    pub stable_diff: f64,
    /// Minimum number of stable differences for a run to be reported.
    pub stable_duration: usize,
    /// Step that pushes the trace out of control (exclusive).
    pub u_diff: f64,
    /// Step that counts as back in control (inclusive); `u_diff` when unset.
    pub s_diff: Option<f64>,
    /// Quiet differences needed before an unstable run closes.
    pub unstable_duration: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stable_diff: 0.0,
            stable_duration: 1,
            u_diff: 0.5,
            s_diff: None,
            unstable_duration: DEFAULT_STABILITY_DURATION,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure_non_negative("stable_diff", self.stable_diff)?;
        ensure_positive("stable_duration", self.stable_duration)?;
        ensure_non_negative("u_diff", self.u_diff)?;
        if let Some(s_diff) = self.s_diff {
            ensure_non_negative("s_diff", s_diff)?;
        }
        ensure_positive("unstable_duration", self.unstable_duration)?;
        Ok(())
    }
}

/// Settings for turning a hopper or bottle weight trace into classifier
/// observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// Half width (samples) of the median despiking window.
    pub time_radius: usize,
    /// Deviation (grams) beyond which a neighbour counts as disturbed.
    pub amplitude_radius: f64,
    /// Disturbed neighbours tolerated before a sample is rejected.
    pub tolerance: usize,
    /// Keep every n-th sample before differencing.
    pub sampling_interval: usize,
    /// Bins per axis for discretisation.
    pub bins: usize,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            time_radius: 30,
            amplitude_radius: 0.1,
            tolerance: 1,
            sampling_interval: 3600,
            bins: 3,
        }
    }
}

impl ObservationConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure_positive("time_radius", self.time_radius)?;
        ensure_non_negative("amplitude_radius", self.amplitude_radius)?;
        ensure_positive("sampling_interval", self.sampling_interval)?;
        ensure_positive("bins", self.bins)?;
        Ok(())
    }
}

/// Full parameter set for the conditioning pipelines, usually loaded from TOML:
///
/// ```toml
/// [spikes]
/// threshold = 0.5
/// backward_window = 10
///
/// [runs]
/// u_diff = 0.3
/// s_diff = 0.1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningConfig {
    pub spikes: SpikeConfig,
    pub runs: RunConfig,
    pub observations: ObservationConfig,
}

impl ConditioningConfig {
    pub fn validate(&self) -> SignalResult<()> {
        self.spikes.validate()?;
        self.runs.validate()?;
        self.observations.validate()?;
        Ok(())
    }
}

/// Parse and validate a TOML configuration.
pub fn parse_config(text: &str) -> Result<ConditioningConfig> {
    let config: ConditioningConfig = toml::from_str(text).context("parsing configuration")?;
    config.validate()?;
    Ok(config)
}

/// Read a TOML configuration from disk.
pub fn load_config(path: &Path) -> Result<ConditioningConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("in config {}", path.display()))
}
