use crate::{
    error::{
        ensure_finite, ensure_non_negative, ensure_positive, ensure_same_len, Result, SignalError,
    },
    signal::Events,
};
use serde::{Deserialize, Serialize};

/// Parameters for positive-spike removal on weight sensors (water, food,
/// body mass).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    /// Minimum rise `data[i+1] - data[i]` that counts as a spike.
    pub threshold: f64,
    /// Largest elapsed-time step (seconds) across which a rise is still
    /// attributed to the animal rather than a recording pause.
    pub max_gap_s: f64,
    /// Samples before a spike averaged to form the replacement value.
    pub backward_window: usize,
    /// Samples from the spike onwards overwritten with the replacement value.
    pub forward_window: usize,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_gap_s: 1.0,
            backward_window: 10,
            forward_window: 5,
        }
    }
}

impl SpikeConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("threshold", self.threshold)?;
        ensure_non_negative("max_gap_s", self.max_gap_s)?;
        ensure_positive("backward_window", self.backward_window)?;
        ensure_positive("forward_window", self.forward_window)?;
        Ok(())
    }
}

/// Indices `i` where the sensor jumps up by at least `threshold` between
/// `i` and `i + 1` while no more than one second elapsed.
///
/// Large rises across a pause in recording are not the animal touching the
/// sensor and are skipped. The last index is never reported.
pub fn detect_positive_spikes(data: &[f64], times: &[f64], threshold: f64) -> Result<Events> {
    let cfg = SpikeConfig {
        threshold,
        ..SpikeConfig::default()
    };
    detect_positive_spikes_with_config(data, times, &cfg)
}

/// Spike detection with a configurable pause guard (`cfg.max_gap_s`).
pub fn detect_positive_spikes_with_config(
    data: &[f64],
    times: &[f64],
    cfg: &SpikeConfig,
) -> Result<Events> {
    ensure_same_len(data, times)?;
    ensure_finite("threshold", cfg.threshold)?;
    ensure_non_negative("max_gap_s", cfg.max_gap_s)?;
    let indices = data
        .windows(2)
        .zip(times.windows(2))
        .enumerate()
        .filter(|(_, (d, t))| d[1] - d[0] >= cfg.threshold && t[1] - t[0] <= cfg.max_gap_s)
        .map(|(i, _)| i)
        .collect();
    Ok(Events::from_indices(indices))
}

/// Replace each spike with the mean of the samples preceding it.
///
/// Spikes are handled in ascending order. For spike `i` the mean of
/// `out[i - backward_window .. i]` is taken from the output as it stands, so
/// a spike closer than `forward_window` to an earlier one averages values
/// that were already smoothed. That mean then overwrites
/// `out[i .. i + forward_window]`.
///
/// Fails without touching anything if a spike lacks `backward_window`
/// samples to its left or `forward_window` samples from itself onwards.
pub fn smooth_spikes(
    data: &[f64],
    spikes: &[usize],
    backward_window: usize,
    forward_window: usize,
) -> Result<Vec<f64>> {
    ensure_positive("backward_window", backward_window)?;
    ensure_positive("forward_window", forward_window)?;
    let n = data.len();
    let mut order = spikes.to_vec();
    order.sort_unstable();
    order.dedup();
    for &i in &order {
        if i < backward_window {
            return Err(SignalError::insufficient(format!(
                "spike at {i} has fewer than {backward_window} samples before it"
            )));
        }
        if i + forward_window > n {
            return Err(SignalError::insufficient(format!(
                "spike at {i} has fewer than {forward_window} samples from it to the end ({n})"
            )));
        }
    }

    let mut out = data.to_vec();
    let denom = backward_window as f64;
    for i in order {
        let mean = out[i - backward_window..i].iter().sum::<f64>() / denom;
        out[i..i + forward_window].fill(mean);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_fixture() -> (Vec<f64>, Vec<f64>) {
        let mut data = vec![0.0; 100];
        data[3] = 0.1;
        data[11] = 0.88;
        data[15] = 2.5;
        data[27] = -3.0;
        data[50] = 0.8;
        data[55] = 0.49;
        data[90] = 0.9;
        // recording paused between index 49 and 50
        let times = (0..50)
            .map(|t| t as f64)
            .chain((0..50).map(|t| t as f64 + 100.0))
            .collect();
        (data, times)
    }

    #[test]
    fn finds_spikes_outside_pauses() {
        let (data, times) = weight_fixture();
        let spikes = detect_positive_spikes(&data, &times, 0.5).unwrap();
        assert_eq!(spikes.indices, vec![10, 14, 27, 89]);

        let spikes = detect_positive_spikes(&data, &times, 0.1).unwrap();
        assert_eq!(spikes.indices, vec![2, 10, 14, 27, 54, 89]);
    }

    #[test]
    fn rise_after_pause_is_not_a_spike() {
        let data = [1.0, 1.0, 1.0, 5.0, 5.0];
        let times = [0.0, 1.0, 2.0, 60.0, 61.0];
        let spikes = detect_positive_spikes(&data, &times, 1.0).unwrap();
        assert!(spikes.is_empty());

        let cfg = SpikeConfig {
            threshold: 1.0,
            max_gap_s: 120.0,
            ..SpikeConfig::default()
        };
        let spikes = detect_positive_spikes_with_config(&data, &times, &cfg).unwrap();
        assert_eq!(spikes.indices, vec![2]);
    }

    #[test]
    fn last_index_never_reported() {
        let data = [0.0, 0.0, 0.0, 9.0];
        let times = [0.0, 1.0, 2.0, 3.0];
        let spikes = detect_positive_spikes(&data, &times, 0.5).unwrap();
        assert_eq!(spikes.indices, vec![2]);
        assert!(spikes.indices.iter().all(|&i| i < data.len() - 1));
    }

    #[test]
    fn spike_detection_checks_shapes() {
        assert!(matches!(
            detect_positive_spikes(&[1.0, 2.0], &[0.0], 0.5),
            Err(SignalError::ShapeMismatch { .. })
        ));
        assert!(detect_positive_spikes(&[], &[], 0.5).unwrap().is_empty());
    }

    #[test]
    fn smoothing_sees_earlier_replacements() {
        let (data, _) = weight_fixture();
        let out = smooth_spikes(&data, &[10, 14, 27, 89], 10, 5).unwrap();
        let mut expected = data.clone();
        expected[10..15].fill(0.01);
        expected[14..19].fill(0.004);
        expected[27..32].fill(0.0008);
        expected[89..94].fill(0.0);
        expected[90..95].fill(0.0);
        for (i, (a, e)) in out.iter().zip(&expected).enumerate() {
            assert!((a - e).abs() < 1e-15, "index {}: {} vs {}", i, a, e);
        }
        // input is untouched
        assert_eq!(data[15], 2.5);
    }

    #[test]
    fn smoothing_rejects_spikes_near_edges() {
        let data = vec![1.0; 20];
        assert!(matches!(
            smooth_spikes(&data, &[3], 5, 2),
            Err(SignalError::InsufficientContext(_))
        ));
        assert!(matches!(
            smooth_spikes(&data, &[6, 18], 5, 3),
            Err(SignalError::InsufficientContext(_))
        ));
        assert!(smooth_spikes(&data, &[17], 5, 3).is_ok());
        assert!(matches!(
            smooth_spikes(&data, &[10], 0, 3),
            Err(SignalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn unordered_spikes_are_processed_ascending() {
        let (data, _) = weight_fixture();
        let sorted = smooth_spikes(&data, &[10, 14, 27, 89], 10, 5).unwrap();
        let shuffled = smooth_spikes(&data, &[89, 14, 27, 10], 10, 5).unwrap();
        assert_eq!(sorted, shuffled);
    }
}
