use crate::error::{ensure_non_negative, ensure_positive, Result, SignalError};

/// Highest wheel speed (revolutions per second) the cage reliably resolves.
pub const DEFAULT_MAX_RPS: f64 = 10.0;

/// Cap wheel revolution counts at `max_rps`.
pub fn clamp_wheel_rate(data: &[f64], max_rps: f64) -> Result<Vec<f64>> {
    ensure_non_negative("max_rps", max_rps)?;
    Ok(data
        .iter()
        .map(|&v| if v > max_rps { max_rps } else { v })
        .collect())
}

/// Median filter that rejects samples sitting in a disturbed neighbourhood.
///
/// For every `i` in `[radius, len - radius)` the window is
/// `data[i - radius .. i + radius]` (the sample at `i + radius` is not
/// included). When more than `tolerance` window samples differ from
/// `data[i]` by more than `amplitude`, position `i` is rejected (`None`);
/// otherwise it takes the window median. Positions within `radius` of either
/// edge are `Some(0.0)`.
pub fn median_despike(
    data: &[f64],
    radius: usize,
    amplitude: f64,
    tolerance: usize,
) -> Result<Vec<Option<f64>>> {
    ensure_positive("radius", radius)?;
    ensure_non_negative("amplitude", amplitude)?;
    let n = data.len();
    if n <= 2 * radius {
        return Err(SignalError::insufficient(format!(
            "radius {radius} leaves no interior samples in a series of {n}"
        )));
    }

    let mut out = vec![Some(0.0); n];
    let mut scratch = Vec::with_capacity(2 * radius);
    for i in radius..n - radius {
        let window = &data[i - radius..i + radius];
        let centre = data[i];
        let disturbed = window
            .iter()
            .filter(|&&v| (v - centre).abs() > amplitude)
            .count();
        out[i] = if disturbed > tolerance {
            None
        } else {
            scratch.clear();
            scratch.extend_from_slice(window);
            Some(median(&mut scratch))
        };
    }
    Ok(out)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Fill rejected blocks with a straight line between their neighbours.
///
/// A block `[l, r)` of `None` becomes a ramp from `values[l-1]` to
/// `values[r]`. Blocks touching either end have nothing to anchor on and
/// fail with `InsufficientContext`.
pub fn interpolate_rejected(values: &[Option<f64>]) -> Result<Vec<f64>> {
    let n = values.len();
    let mut out = vec![0.0; n];
    let mut i = 0;
    while i < n {
        match values[i] {
            Some(value) => {
                out[i] = value;
                i += 1;
            }
            None => {
                let end = (i..n).find(|&j| values[j].is_some()).ok_or_else(|| {
                    SignalError::insufficient(format!("rejected block from {i} runs to the end"))
                })?;
                if i == 0 {
                    return Err(SignalError::insufficient(
                        "rejected block starts at the first sample",
                    ));
                }
                let from = out[i - 1];
                let to = values[end].unwrap_or(from);
                let step = (to - from) / (end - i + 1) as f64;
                for (k, slot) in out[i..end].iter_mut().enumerate() {
                    *slot = from + (k + 1) as f64 * step;
                }
                out[end] = to;
                i = end + 1;
            }
        }
    }
    Ok(out)
}

/// Running count of rejected positions.
pub fn rejected_cumsum(values: &[Option<f64>]) -> Vec<usize> {
    values
        .iter()
        .scan(0usize, |count, v| {
            if v.is_none() {
                *count += 1;
            }
            Some(*count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_rate_is_capped() {
        let out = clamp_wheel_rate(&[0.0, 4.0, 12.0, 10.0, 30.0], DEFAULT_MAX_RPS).unwrap();
        assert_eq!(out, vec![0.0, 4.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn quiet_signal_takes_window_median() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let out = median_despike(&data, 2, 10.0, 0).unwrap();
        // window for i=2 is data[0..4]
        assert_eq!(
            out,
            vec![
                Some(0.0),
                Some(0.0),
                Some(2.5),
                Some(3.5),
                Some(4.5),
                Some(0.0),
                Some(0.0)
            ]
        );
    }

    #[test]
    fn disturbed_neighbourhood_is_rejected() {
        let data = [5.0, 5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0, 5.0];
        let out = median_despike(&data, 2, 1.0, 1).unwrap();
        // the 9 only disturbs windows centred on itself once tolerance is 1
        assert_eq!(out[2], Some(5.0));
        assert_eq!(out[4], None);
        assert_eq!(out[6], Some(5.0));
        let strict = median_despike(&data, 2, 1.0, 0).unwrap();
        assert_eq!(strict[3], None);
    }

    #[test]
    fn despike_needs_interior() {
        assert!(matches!(
            median_despike(&[1.0, 2.0, 3.0, 4.0], 2, 1.0, 0),
            Err(SignalError::InsufficientContext(_))
        ));
        assert!(median_despike(&[1.0, 2.0, 3.0], 0, 1.0, 0).is_err());
    }

    #[test]
    fn rejected_blocks_become_ramps() {
        let values = [Some(1.0), Some(2.0), None, None, Some(5.0), Some(6.0)];
        let out = interpolate_rejected(&values).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(rejected_cumsum(&values), vec![0, 0, 1, 2, 2, 2]);
    }

    #[test]
    fn edge_blocks_cannot_be_interpolated() {
        assert!(interpolate_rejected(&[None, Some(1.0)]).is_err());
        assert!(interpolate_rejected(&[Some(1.0), None]).is_err());
        assert!(interpolate_rejected(&[]).unwrap().is_empty());
    }
}
