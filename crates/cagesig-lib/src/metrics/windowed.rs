//! Sliding-window aggregates over per-second sensor traces.
//!
//! Everything here runs in linear time: sums are carried from one window
//! position to the next (add the incoming sample, drop the outgoing one) or
//! taken as differences of a cumulative sum.

use crate::error::{ensure_finite, ensure_positive, ensure_same_len, Result, SignalError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Aggregate computed by [`moving_function`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Sum,
    Average,
}

impl FromStr for WindowFunction {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(WindowFunction::Sum),
            "average" | "mean" => Ok(WindowFunction::Average),
            other => Err(SignalError::invalid(
                "function",
                format!("expected `sum` or `average`, got `{other}`"),
            )),
        }
    }
}

/// What [`moving_function`] reports where the window hangs over an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// Mode 1: keep the partial-overlap aggregate.
    Partial,
    /// Mode 2: overwrite edge positions with the raw samples.
    Raw,
}

impl TryFrom<u8> for Boundary {
    type Error = SignalError;

    fn try_from(mode: u8) -> Result<Self> {
        match mode {
            1 => Ok(Boundary::Partial),
            2 => Ok(Boundary::Raw),
            other => Err(SignalError::invalid(
                "boundary",
                format!("expected 1 or 2, got {other}"),
            )),
        }
    }
}

/// Moving sum or average with a window centred on each sample.
///
/// The window covering index `i` spans `[i - left, i + right]` with
/// `right = (window - 1) / 2` and `left = window - 1 - right`, so an even
/// window puts its extra sample to the left of centre. With
/// [`Boundary::Raw`] the first `left` and last `right` positions (the
/// ceil/floor split of the `window - 1` partial overlaps) take the raw value
/// for either function. A window of 2 has no trailing overlap, so its last
/// position keeps the partial aggregate.
/// `Average` is the `Sum` result divided by `window`, edges aside.
pub fn moving_function(
    data: &[f64],
    window: usize,
    function: WindowFunction,
    boundary: Boundary,
) -> Result<Vec<f64>> {
    ensure_positive("window", window)?;
    let n = data.len();
    if window > n {
        return Err(SignalError::insufficient(format!(
            "window of {window} samples exceeds series of {n}"
        )));
    }
    let right = (window - 1) / 2;
    let left = window - 1 - right;

    let mut out = Vec::with_capacity(n);
    let mut acc: f64 = data[..=right].iter().sum();
    out.push(acc);
    for i in 1..n {
        if i + right < n {
            acc += data[i + right];
        }
        if i > left {
            acc -= data[i - left - 1];
        }
        out.push(acc);
    }

    if function == WindowFunction::Average {
        let w = window as f64;
        for value in out.iter_mut() {
            *value /= w;
        }
    }
    if boundary == Boundary::Raw {
        out[..left].copy_from_slice(&data[..left]);
        out[n - right..].copy_from_slice(&data[n - right..]);
    }
    Ok(out)
}

/// Mean of the `2r + 1` samples centred on each index.
///
/// Positions closer than `r` to either edge report 0.
pub fn centered_moving_average(data: &[f64], r: usize) -> Result<Vec<f64>> {
    let span = r
        .checked_mul(2)
        .and_then(|v| v.checked_add(1))
        .ok_or_else(|| SignalError::invalid("r", "radius overflows the window size"))?;
    let n = data.len();
    if n < span {
        return Err(SignalError::insufficient(format!(
            "radius {r} needs {span} samples, series has {n}"
        )));
    }
    let denom = span as f64;
    let mut out = vec![0.0; n];
    let mut acc: f64 = data[..span].iter().sum();
    out[r] = acc / denom;
    for i in r + 1..n - r {
        acc += data[i + r];
        acc -= data[i - r - 1];
        out[i] = acc / denom;
    }
    Ok(out)
}

/// Path length along each axis over a sliding window of `window` steps.
///
/// Element `i` of each output is the sum of `|v[k+1] - v[k]|` for
/// `k in i..i+window`, i.e. the movement between samples `i` and
/// `i + window` inclusive. Both outputs hold `len - window` entries.
pub fn xy_distance_over_window(
    xs: &[f64],
    ys: &[f64],
    window: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    ensure_same_len(xs, ys)?;
    ensure_positive("window", window)?;
    if xs.len() <= window {
        return Err(SignalError::insufficient(format!(
            "window of {window} steps needs more than {} samples",
            xs.len()
        )));
    }
    Ok((
        step_length_over_window(xs, window),
        step_length_over_window(ys, window),
    ))
}

fn step_length_over_window(data: &[f64], window: usize) -> Vec<f64> {
    let travelled = cumulative(data.windows(2).map(|w| (w[1] - w[0]).abs()));
    window_totals(&travelled, window)
}

/// Linear distance run on the wheel per window of `window` seconds.
///
/// `revs_per_sec` holds wheel revolutions counted each second; each window's
/// revolutions are converted with `2π · radius`. The output holds
/// `len + 1 - window` entries.
pub fn wheel_distance_over_window(
    revs_per_sec: &[f64],
    window: usize,
    radius: f64,
) -> Result<Vec<f64>> {
    ensure_positive("window", window)?;
    ensure_finite("radius", radius)?;
    if radius <= 0.0 {
        return Err(SignalError::invalid(
            "radius",
            format!("must be > 0, got {radius}"),
        ));
    }
    if revs_per_sec.len() < window {
        return Err(SignalError::insufficient(format!(
            "window of {window} samples exceeds series of {}",
            revs_per_sec.len()
        )));
    }
    let circumference = 2.0 * PI * radius;
    let revolutions = cumulative(revs_per_sec.iter().copied());
    Ok(window_totals(&revolutions, window)
        .into_iter()
        .map(|revs| revs * circumference)
        .collect())
}

/// Number of rearing samples (`z > 0`) in each window of `window` samples.
/// The output holds `len + 1 - window` entries.
pub fn rearing_over_window(z: &[f64], window: usize) -> Result<Vec<usize>> {
    ensure_positive("window", window)?;
    if z.len() < window {
        return Err(SignalError::insufficient(format!(
            "window of {window} samples exceeds series of {}",
            z.len()
        )));
    }
    let mut counts = Vec::with_capacity(z.len() + 1);
    counts.push(0usize);
    let mut running = 0usize;
    for &value in z {
        if value > 0.0 {
            running += 1;
        }
        counts.push(running);
    }
    Ok((0..=z.len() - window)
        .map(|i| counts[i + window] - counts[i])
        .collect())
}

/// Manhattan path length of a single coordinate trace.
pub fn distance_traveled_1d(data: &[f64]) -> f64 {
    data.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

/// Euclidean path length of an x/y trace.
pub fn distance_traveled_2d(xs: &[f64], ys: &[f64]) -> Result<f64> {
    ensure_same_len(xs, ys)?;
    Ok(xs
        .windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]).hypot(y[1] - y[0]))
        .sum())
}

/// Running sum with a leading zero: `out[k]` is the sum of the first `k` values.
fn cumulative(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let values = values.into_iter();
    let mut out = Vec::with_capacity(values.size_hint().0 + 1);
    let mut acc = 0.0;
    out.push(acc);
    for value in values {
        acc += value;
        out.push(acc);
    }
    out
}

fn window_totals(cumsum: &[f64], window: usize) -> Vec<f64> {
    (0..cumsum.len() - window)
        .map(|i| cumsum[i + window] - cumsum[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn naive_window_sum(data: &[f64], window: usize) -> Vec<f64> {
        let right = (window - 1) / 2;
        let left = window - 1 - right;
        (0..data.len())
            .map(|i| {
                let lo = i.saturating_sub(left);
                let hi = (i + right).min(data.len() - 1);
                data[lo..=hi].iter().sum()
            })
            .collect()
    }

    fn assert_all_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() <= tol,
                "index {}: {} vs {} (tol {})",
                i,
                a,
                e,
                tol
            );
        }
    }

    #[test]
    fn odd_window_sum_matches_direct_sums() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_function(&data, 3, WindowFunction::Sum, Boundary::Partial).unwrap();
        assert_eq!(out, vec![3.0, 6.0, 9.0, 12.0, 9.0]);
    }

    #[test]
    fn even_window_leans_left() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = moving_function(&data, 4, WindowFunction::Sum, Boundary::Partial).unwrap();
        // window at i covers [i-2, i+1]
        assert_eq!(out, vec![3.0, 6.0, 10.0, 14.0, 12.0]);
    }

    #[test]
    fn average_is_sum_over_window() {
        let mut rng = StdRng::seed_from_u64(7);
        for window in 1..9 {
            let data: Vec<f64> = (0..40).map(|_| rng.gen_range(-5.0..5.0)).collect();
            let sum = moving_function(&data, window, WindowFunction::Sum, Boundary::Partial)
                .unwrap();
            let avg = moving_function(&data, window, WindowFunction::Average, Boundary::Partial)
                .unwrap();
            for (s, a) in sum.iter().zip(&avg) {
                assert_eq!(*a, s / window as f64);
            }
        }
    }

    #[test]
    fn raw_boundary_copies_edges() {
        let data: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        for (window, lead, trail) in [(5usize, 2usize, 2usize), (4, 2, 1), (6, 3, 2), (1, 0, 0)] {
            let out = moving_function(&data, window, WindowFunction::Sum, Boundary::Raw).unwrap();
            let partial =
                moving_function(&data, window, WindowFunction::Sum, Boundary::Partial).unwrap();
            assert_eq!(&out[..lead], &data[..lead], "window {}", window);
            assert_eq!(&out[10 - trail..], &data[10 - trail..], "window {}", window);
            assert_eq!(&out[lead..10 - trail], &partial[lead..10 - trail]);
        }
    }

    #[test]
    fn raw_boundary_keeps_samples_when_averaging() {
        let data = [10.0, 20.0, 30.0, 40.0, 50.0];
        let out = moving_function(&data, 3, WindowFunction::Average, Boundary::Raw).unwrap();
        assert_eq!(out[0], 10.0);
        assert_eq!(out[4], 50.0);
        assert_eq!(&out[1..4], &[20.0, 30.0, 40.0]);

        let out = moving_function(&data, 2, WindowFunction::Average, Boundary::Raw).unwrap();
        assert_eq!(out[0], 10.0);
        // no trailing overlap for an even window of 2
        assert_eq!(out[4], 45.0);
    }

    #[test]
    fn running_sum_agrees_with_direct_sum() {
        let mut rng = StdRng::seed_from_u64(11);
        for window in [1usize, 2, 3, 8, 25] {
            let data: Vec<f64> = (0..200).map(|_| rng.gen::<f64>()).collect();
            let out = moving_function(&data, window, WindowFunction::Sum, Boundary::Partial)
                .unwrap();
            assert_all_close(&out, &naive_window_sum(&data, window), 1e-9);
        }
    }

    #[test]
    fn moving_function_rejects_bad_windows() {
        let data = [1.0, 2.0];
        assert!(matches!(
            moving_function(&data, 0, WindowFunction::Sum, Boundary::Partial),
            Err(SignalError::InvalidParameter { .. })
        ));
        assert!(matches!(
            moving_function(&data, 3, WindowFunction::Sum, Boundary::Partial),
            Err(SignalError::InsufficientContext(_))
        ));
        assert!(Boundary::try_from(3).is_err());
        assert_eq!("average".parse::<WindowFunction>().unwrap(), WindowFunction::Average);
    }

    #[test]
    fn centered_average_small_case() {
        let data = [1.0, 4.0, 5.0, 19.0, 2.0, 2.0, 4.0, 5.0];
        let out = centered_moving_average(&data, 3).unwrap();
        assert_eq!(
            out,
            vec![0.0, 0.0, 0.0, 37.0 / 7.0, 41.0 / 7.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn centered_average_matches_direct_mean() {
        let mut rng = StdRng::seed_from_u64(2016);
        for _ in 0..50 {
            let n = rng.gen_range(1..300);
            let r = rng.gen_range(0..=(n - 1) / 2);
            let data: Vec<f64> = (0..n).map(|_| rng.gen_range(-100.0..100.0)).collect();
            let out = centered_moving_average(&data, r).unwrap();
            let span = 2 * r + 1;
            for i in 0..n {
                let expected = if i >= r && i + r < n {
                    data[i - r..=i + r].iter().sum::<f64>() / span as f64
                } else {
                    0.0
                };
                assert!(
                    (out[i] - expected).abs() <= 1e-9,
                    "n={} r={} i={}: {} vs {}",
                    n,
                    r,
                    i,
                    out[i],
                    expected
                );
            }
        }
    }

    #[test]
    fn centered_average_needs_full_window() {
        assert!(matches!(
            centered_moving_average(&[1.0, 2.0, 3.0, 4.0], 2),
            Err(SignalError::InsufficientContext(_))
        ));
        assert_eq!(centered_moving_average(&[1.0, 2.0], 0).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn xy_distance_sums_absolute_steps() {
        let xs = [0.0, 1.0, 3.0, 2.0, 2.0, 5.0];
        let ys = [0.0, 0.0, -1.0, -1.0, 1.0, 1.0];
        let (dx, dy) = xy_distance_over_window(&xs, &ys, 2).unwrap();
        assert_eq!(dx, vec![3.0, 3.0, 1.0, 3.0]);
        assert_eq!(dy, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn xy_distance_checks_shapes() {
        assert!(matches!(
            xy_distance_over_window(&[0.0, 1.0, 2.0], &[0.0, 1.0], 1),
            Err(SignalError::ShapeMismatch { left: 3, right: 2 })
        ));
        assert!(matches!(
            xy_distance_over_window(&[0.0, 1.0], &[0.0, 1.0], 2),
            Err(SignalError::InsufficientContext(_))
        ));
    }

    #[test]
    fn wheel_distance_converts_revolutions() {
        let revs = [1.0, 0.0, 2.0, 3.0];
        let out = wheel_distance_over_window(&revs, 2, 0.5).unwrap();
        assert_eq!(out.len(), 3);
        assert_all_close(&out, &[PI, 2.0 * PI, 5.0 * PI], 1e-12);
        assert!(wheel_distance_over_window(&revs, 2, 0.0).is_err());
        assert!(wheel_distance_over_window(&revs, 5, 1.0).is_err());
    }

    #[test]
    fn rearing_counts_positive_samples() {
        let z = [0.0, 1.0, 2.0, -1.0, 0.0, 3.0];
        assert_eq!(rearing_over_window(&z, 3).unwrap(), vec![2, 2, 1, 1]);
        assert_eq!(rearing_over_window(&z, 6).unwrap(), vec![3]);
    }

    #[test]
    fn distance_traveled_totals() {
        assert_eq!(distance_traveled_1d(&[0.0, 2.0, 1.0]), 3.0);
        assert_eq!(distance_traveled_1d(&[]), 0.0);
        let d = distance_traveled_2d(&[0.0, 3.0, 3.0], &[0.0, 4.0, 5.0]).unwrap();
        assert!((d - 6.0).abs() < 1e-12);
    }
}
