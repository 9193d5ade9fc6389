use anyhow::{bail, Context, Result};
use std::{fmt::Display, path::Path, str::FromStr};

/// Parse one value per line, skipping blank lines and `#` comments.
fn parse_lines<T>(text: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.parse::<T>() {
            Ok(value) => out.push(value),
            Err(err) => bail!("line {} is not {}: {} ({})", idx + 1, what, trimmed, err),
        }
    }
    if out.is_empty() {
        bail!("no {} found", what);
    }
    Ok(out)
}

/// Parse a newline-delimited sample series.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    parse_lines(text, "a number")
}

/// Read a newline-delimited sample series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("in {}", path.display()))
}

/// Parse newline-delimited sample indices (e.g. spike positions).
pub fn parse_index_list(text: &str) -> Result<Vec<usize>> {
    parse_lines(text, "a sample index")
}

/// Read sample indices from disk.
pub fn read_index_list(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_index_list(&text).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let series = parse_f64_series("# water (g)\n1.5\n\n  2.25 \n-3\n").unwrap();
        assert_eq!(series, vec![1.5, 2.25, -3.0]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("1.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_index_list("4\n-1\n").is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_f64_series("# nothing\n\n").is_err());
        assert_eq!(parse_index_list("10\n14\n").unwrap(), vec![10, 14]);
    }
}
