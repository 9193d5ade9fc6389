use thiserror::Error;

/// Failures raised by the conditioning and segmentation routines.
///
/// Every routine validates its arguments before it allocates or writes, so an
/// error never leaves a partially computed result behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Paired sequences (values/timestamps, x/y) differ in length.
    #[error("paired sequences differ in length ({left} vs {right})")]
    ShapeMismatch { left: usize, right: usize },
    /// A window, margin or radius reaches past the available samples.
    #[error("insufficient context: {0}")]
    InsufficientContext(String),
    /// A parameter is structurally meaningless (zero window, NaN threshold, ...).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SignalError>;

impl SignalError {
    pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
        SignalError::InsufficientContext(msg.into())
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub(crate) fn ensure_same_len(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(SignalError::ShapeMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_positive(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(SignalError::invalid(name, "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SignalError::invalid(name, format!("must be finite, got {value}")));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(SignalError::invalid(name, format!("must be >= 0, got {value}")));
    }
    Ok(())
}
