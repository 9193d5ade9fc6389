//! Run segmentation over consecutive differences or raw values.
//!
//! Each scanner walks the series once, left to right, and closes a run as
//! soon as its predicate fails. Runs never overlap and come out in ascending
//! start order. Note the two length conventions: [`stable_sequences`] and
//! [`unstable_sequences`] count *differences*, [`valued_sequences`] counts
//! *elements*, so the same plateau of k equal samples is reported as
//! `k - 1` by the former and `k` by the latter.

use crate::{
    error::{ensure_non_negative, ensure_positive, Result},
    signal::{within_bound, Span},
};
use log::debug;

/// Stability duration used when callers don't pick one.
pub const DEFAULT_STABILITY_DURATION: usize = 10;

#[derive(Debug, Clone, Copy)]
struct OpenRun {
    start: usize,
    count: usize,
}

/// Collects maximal runs of positions where a predicate holds.
#[derive(Debug)]
struct PredicateScanner {
    min_count: usize,
    open: Option<OpenRun>,
    spans: Vec<Span>,
}

impl PredicateScanner {
    fn new(min_count: usize) -> Self {
        Self {
            min_count,
            open: None,
            spans: Vec::new(),
        }
    }

    /// `start` is the index a run begins at if `holds` opens one here.
    fn feed(&mut self, start: usize, holds: bool) {
        if !holds {
            self.close();
            return;
        }
        if let Some(run) = self.open.as_mut() {
            run.count += 1;
        } else {
            self.open = Some(OpenRun { start, count: 1 });
        }
    }

    fn close(&mut self) {
        if let Some(run) = self.open.take() {
            if run.count >= self.min_count {
                self.spans.push(Span::new(run.start, run.count));
            }
        }
    }

    fn finish(mut self) -> Vec<Span> {
        self.close();
        self.spans
    }
}

/// Runs where consecutive samples stay within `diff` of each other.
///
/// A run starts at `idx - 1` when `|data[idx-1] - data[idx]| <= diff` and
/// lasts while the bound keeps holding. The reported length is the number of
/// qualifying differences (one less than the number of samples), and only
/// runs with at least `stability_duration` differences are kept.
pub fn stable_sequences(data: &[f64], diff: f64, stability_duration: usize) -> Result<Vec<Span>> {
    ensure_non_negative("diff", diff)?;
    ensure_positive("stability_duration", stability_duration)?;
    let mut scanner = PredicateScanner::new(stability_duration);
    for (idx, pair) in data.windows(2).enumerate() {
        scanner.feed(idx, (pair[0] - pair[1]).abs() <= diff);
    }
    let spans = scanner.finish();
    debug!("stable_sequences: {} runs in {} samples", spans.len(), data.len());
    Ok(spans)
}

/// Runs of samples exactly equal to `value`, reported as `(start, length)`
/// where `length` counts samples. Runs shorter than `stability_duration`
/// are dropped.
pub fn valued_sequences(data: &[f64], value: f64, stability_duration: usize) -> Result<Vec<Span>> {
    ensure_positive("stability_duration", stability_duration)?;
    let mut scanner = PredicateScanner::new(stability_duration);
    for (idx, &sample) in data.iter().enumerate() {
        scanner.feed(idx, sample == value);
    }
    Ok(scanner.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stability {
    Stable,
    /// Triggered at difference `trigger`; `settled` consecutive differences
    /// have since stayed within the stability bound.
    Unstable { trigger: usize, settled: usize },
}

#[derive(Debug)]
struct InstabilityScanner {
    u_diff: f64,
    s_diff: f64,
    stability_duration: usize,
    state: Stability,
    spans: Vec<Span>,
}

impl InstabilityScanner {
    /// `position` is the index of the later sample of the difference.
    fn feed(&mut self, position: usize, delta: f64) {
        self.state = match self.state {
            Stability::Stable if delta > self.u_diff => Stability::Unstable {
                trigger: position,
                settled: 0,
            },
            Stability::Stable => Stability::Stable,
            Stability::Unstable { trigger, settled } => {
                let settled = if within_bound(delta, self.s_diff) {
                    settled + 1
                } else {
                    0
                };
                if settled >= self.stability_duration {
                    self.spans.push(Span::new(trigger, position - trigger));
                    Stability::Stable
                } else {
                    Stability::Unstable { trigger, settled }
                }
            }
        };
    }

    fn finish(mut self, len: usize) -> Vec<Span> {
        if let Stability::Unstable { trigger, .. } = self.state {
            self.spans.push(Span::new(trigger, len - 1 - trigger));
        }
        self.spans
    }
}

/// Stretches where the signal leaves statistical control.
///
/// A run is triggered by a difference strictly greater than `u_diff`, at the
/// index of the later sample. It ends once `stability_duration` consecutive
/// differences stay within `s_diff` (default `u_diff`, compared with
/// round-off tolerance); any larger difference restarts that count. The run
/// is reported as `(trigger, offset)` where `trigger + offset` is the sample
/// at which control was regained. A run still open when the data ends is
/// reported up to the last sample.
pub fn unstable_sequences(
    data: &[f64],
    u_diff: f64,
    s_diff: Option<f64>,
    stability_duration: usize,
) -> Result<Vec<Span>> {
    ensure_non_negative("u_diff", u_diff)?;
    let s_diff = s_diff.unwrap_or(u_diff);
    ensure_non_negative("s_diff", s_diff)?;
    ensure_positive("stability_duration", stability_duration)?;
    let mut scanner = InstabilityScanner {
        u_diff,
        s_diff,
        stability_duration,
        state: Stability::Stable,
        spans: Vec::new(),
    };
    for (idx, pair) in data.windows(2).enumerate() {
        scanner.feed(idx + 1, (pair[1] - pair[0]).abs());
    }
    let spans = scanner.finish(data.len());
    debug!(
        "unstable_sequences: {} runs in {} samples",
        spans.len(),
        data.len()
    );
    Ok(spans)
}
