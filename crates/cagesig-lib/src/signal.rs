use crate::error::{ensure_same_len, Result};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Relative tolerance used by [`is_close`].
pub const REL_TOLERANCE: f64 = 1e-5;
/// Absolute tolerance used by [`is_close`].
pub const ABS_TOLERANCE: f64 = 1e-8;

/// Per-second sensor samples paired with elapsed seconds since the start of
/// the recording. Timestamps are non-decreasing; gaps mark recording pauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSeries {
    pub data: Vec<f64>,
    pub times: Vec<f64>,
}

impl TimedSeries {
    pub fn new(data: Vec<f64>, times: Vec<f64>) -> Result<Self> {
        ensure_same_len(&data, &times)?;
        Ok(Self { data, times })
    }

    /// Series sampled once per second without pauses.
    pub fn contiguous(data: Vec<f64>) -> Self {
        let times = (0..data.len()).map(|i| i as f64).collect();
        Self { data, times }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Point events on a timeline (e.g. spike indices)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A contiguous run `{start, length}`. What `length` counts (differences or
/// elements) depends on the scanner that produced it.
///
/// Serialises as a `[start, length]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// One past the last index touched by a span measured in elements.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, length): (usize, usize)) -> Self {
        Span::new(start, length)
    }
}

impl From<Span> for (usize, usize) {
    fn from(span: Span) -> Self {
        (span.start, span.length)
    }
}

/// Relative + absolute closeness test, `|a - b| <= atol + rtol * |b|`.
pub fn is_close<T: Float>(a: T, b: T) -> bool {
    let rtol = T::from(REL_TOLERANCE).unwrap_or_else(T::epsilon);
    let atol = T::from(ABS_TOLERANCE).unwrap_or_else(T::epsilon);
    if a == b {
        return true;
    }
    (a - b).abs() <= atol + rtol * b.abs()
}

/// `value <= bound`, also accepting values that only exceed the bound by
/// round-off.
pub fn within_bound<T: Float>(value: T, bound: T) -> bool {
    value <= bound || is_close(value, bound)
}
