use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

/// Read the named numeric columns from a delimited file with a header row.
///
/// Columns are matched case-insensitively and returned in the order
/// requested, all with one entry per record. Empty cells are read as NaN.
pub fn read_columns(path: &Path, names: &[&str], delimiter: u8) -> Result<Vec<Vec<f64>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers().context("reading header")?.clone();
    let indices = names
        .iter()
        .map(|name| locate_column(&headers, name))
        .collect::<Result<Vec<_>>>()?;

    let mut columns = vec![Vec::new(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading record {}", row + 1))?;
        for ((&idx, name), column) in indices.iter().zip(names).zip(columns.iter_mut()) {
            let cell = record.get(idx).unwrap_or("");
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().with_context(|| {
                    format!("record {}: column {} is not numeric: {}", row + 1, name, cell)
                })?
            };
            column.push(value);
        }
    }
    Ok(columns)
}

/// Read a single named column.
pub fn read_column(path: &Path, name: &str, delimiter: u8) -> Result<Vec<f64>> {
    let mut columns = read_columns(path, &[name], delimiter)?;
    columns
        .pop()
        .ok_or_else(|| anyhow!("column {} produced no data", name))
}

fn locate_column(headers: &StringRecord, requested: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| anyhow!("missing column ({})", requested))
}
