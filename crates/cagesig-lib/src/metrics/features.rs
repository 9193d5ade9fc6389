use crate::error::{ensure_positive, ensure_same_len, Result, SignalError};
use log::warn;

/// Margin added around the observed range before binning.
const BIN_MARGIN: f64 = 0.01;

/// 1.0 where the z beam reports a rearing animal (`z > 0`), else 0.0.
pub fn binary_rearing(z: &[f64]) -> Vec<f64> {
    z.iter().map(|&v| if v > 0.0 { 1.0 } else { 0.0 }).collect()
}

/// Map paired observations onto a `bins × bins` grid and flatten.
///
/// Each axis is cut into `bins` equal-width bins over
/// `[min - 0.01, max + 0.01]`; the code of a pair is `x_bin * bins + y_bin`.
pub fn discretize_observations(xs: &[f64], ys: &[f64], bins: usize) -> Result<Vec<usize>> {
    ensure_same_len(xs, ys)?;
    ensure_positive("bins", bins)?;
    if xs.is_empty() {
        return Err(SignalError::insufficient("no observations to discretize"));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(SignalError::invalid("observations", "must all be finite"));
    }
    let x_edges = bin_edges(xs, bins);
    let y_edges = bin_edges(ys, bins);
    Ok(xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| bin_of(&x_edges, x) * bins + bin_of(&y_edges, y))
        .collect())
}

fn bin_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let start = lo - BIN_MARGIN;
    let stop = hi + BIN_MARGIN;
    let step = (stop - start) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|k| start + k as f64 * step).collect();
    edges.push(stop);
    edges
}

/// Index of the first edge not below `value`, minus one.
fn bin_of(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    edges
        .partition_point(|&edge| edge < value)
        .saturating_sub(1)
        .min(bins - 1)
}

/// Cut a trace into rows of `signal_length` samples and whiten them.
///
/// Only the `len / signal_length` complete rows are used. Each row has its
/// mean removed, then each column is divided by its population standard
/// deviation; a column with zero deviation is left unscaled.
pub fn trace_to_signals_matrix(data: &[f64], signal_length: usize) -> Result<Vec<Vec<f64>>> {
    ensure_positive("signal_length", signal_length)?;
    let rows = data.len() / signal_length;
    if rows == 0 {
        return Err(SignalError::insufficient(format!(
            "signal length {signal_length} exceeds series of {}",
            data.len()
        )));
    }
    let mut matrix: Vec<Vec<f64>> = data
        .chunks_exact(signal_length)
        .map(|row| {
            let mean = row.iter().sum::<f64>() / signal_length as f64;
            row.iter().map(|v| v - mean).collect()
        })
        .collect();

    for col in 0..signal_length {
        let mean = matrix.iter().map(|row| row[col]).sum::<f64>() / rows as f64;
        let var = matrix
            .iter()
            .map(|row| (row[col] - mean).powi(2))
            .sum::<f64>()
            / rows as f64;
        let sd = var.sqrt();
        if sd == 0.0 {
            warn!("column {col} has zero deviation, leaving it unscaled");
            continue;
        }
        for row in matrix.iter_mut() {
            row[col] /= sd;
        }
    }
    Ok(matrix)
}
