//! Whitespace-separated output tables (forward, backward, climate).

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{parse_number, Aggregation, Key, KeyFilter, SimData, Value};

/// Read a whitespace-separated numeric table as rows.
pub fn read_table(path: &Path) -> Result<Vec<Vec<f64>>> {
    let content = fs::read_to_string(path)?;
    parse_table(&content, path)
}

/// Parse numeric table content; `path` is used for error reporting.
pub fn parse_table(content: &str, path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                parse_number(token).ok_or_else(|| Error::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: format!("not a number: {}", token),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Turn rows into columns. Rows must have equal length.
pub(crate) fn transpose(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, |r| r.len());
    (0..width)
        .map(|col| rows.iter().map(|row| row[col]).collect())
        .collect()
}

/// Parse an output table into `body:Var:<aggregation>` series.
///
/// Column *i* is named by the *i*-th entry of `order`.
pub fn process_output_file(
    path: &Path,
    data: &mut SimData,
    body: &str,
    order: &[(String, String)],
    aggregation: Aggregation,
    filter: &KeyFilter,
) -> Result<()> {
    log::debug!("Processing output file {}", path.display());
    let content = fs::read_to_string(path)?;
    let rows = parse_table(&content, path)?;

    for (idx, row) in rows.iter().enumerate() {
        if row.len() != order.len() {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: format!("expected {} columns, found {}", order.len(), row.len()),
            });
        }
    }

    let columns = if rows.is_empty() {
        vec![Vec::new(); order.len()]
    } else {
        transpose(&rows)
    };

    for ((var, units), column) in order.iter().zip(columns) {
        let key = Key::new(body, var.as_str(), aggregation).to_string();
        if filter.accepts(&key) {
            data.insert_value(key, units, Value::Series(column));
        }
    }
    Ok(())
}
