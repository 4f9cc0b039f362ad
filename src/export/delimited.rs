//! Delimited text output (writeoutput, bptocsv, Ulysses CSV).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract::{extract_column, extract_units, statistic_per_value};
use crate::filter::archive_to_filtered;
use crate::model::{format_number, Key, SimData, Value};
use crate::store::BplFile;

use super::OutputOptions;

/// Write the columns of `keys` as delimited text.
///
/// Each key is one column; series and matrices are flattened. Rows run to
/// the longest column and shorter columns leave empty cells. A `.bpf`
/// destination writes a filtered file instead.
pub fn write_output<S: AsRef<str>>(
    file: &BplFile,
    keys: &[S],
    options: &OutputOptions,
) -> Result<PathBuf> {
    if !options.ulysses && options.path.extension().is_some_and(|e| e == "bpf") {
        return archive_to_filtered(file, keys, &options.path);
    }

    let (delimiter, header, path) = options.resolved();
    if delimiter.is_empty() {
        return Err(Error::InvalidInput("Delimiter cannot be empty".to_string()));
    }

    let mut headers = Vec::with_capacity(keys.len());
    let mut columns = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        headers.push(header_cell(key, &extract_units(file, key)?));
        columns.push(extract_column(file, key)?.cells());
    }

    let header = header.then_some(headers.as_slice());
    write_table(&path, &delimiter, header, &columns)?;
    Ok(path)
}

/// Write `keys` from an archive in Ulysses format.
///
/// With `group` only that simulation is written.
pub fn archive_to_csv<S: AsRef<str>>(
    file: &BplFile,
    keys: &[S],
    out: &Path,
    group: Option<&str>,
) -> Result<PathBuf> {
    let mut headers = Vec::with_capacity(keys.len());
    let mut columns = Vec::with_capacity(keys.len());

    match group {
        Some(name) => {
            let data = file.group(name).ok_or_else(|| {
                Error::InvalidInput(format!("Group {} not found in {}", name, file.path().display()))
            })?;
            for key in keys {
                let (units, cells) = group_cells(data, key.as_ref())?;
                headers.push(header_cell(key.as_ref(), &units));
                columns.push(cells);
            }
        }
        None => {
            for key in keys {
                let key = key.as_ref();
                headers.push(header_cell(key, &extract_units(file, key)?));
                columns.push(extract_column(file, key)?.cells());
            }
        }
    }

    write_table(out, ",", Some(headers.as_slice()), &columns)?;
    log::info!("Wrote {}", out.display());
    Ok(out.to_path_buf())
}

/// Write every dataset of `data` in Ulysses format.
pub fn data_to_csv(data: &SimData, out: &Path) -> Result<PathBuf> {
    let mut headers = Vec::with_capacity(data.len());
    let mut columns = Vec::with_capacity(data.len());
    for (key, dataset) in data {
        headers.push(header_cell(key, &dataset.units));
        columns.push(dataset.values.iter().flat_map(Value::cells).collect());
    }

    write_table(out, ",", Some(headers.as_slice()), &columns)?;
    log::info!("Wrote {}", out.display());
    Ok(out.to_path_buf())
}

/// Read a delimited file written with a header back into columns.
///
/// The first line names the columns (`key[units]` becomes `key`); the
/// first `header_rows` lines are skipped as headers. Empty cells are
/// dropped.
pub fn csv_to_map(path: &Path, header_rows: usize) -> Result<BTreeMap<String, Vec<String>>> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    let names: Vec<String> = lines
        .next()
        .ok_or_else(|| Error::InvalidInput(format!("{} is empty", path.display())))?
        .split(',')
        .map(|cell| cell.split('[').next().unwrap_or(cell).trim().to_string())
        .collect();

    let mut map: BTreeMap<String, Vec<String>> =
        names.iter().map(|n| (n.clone(), Vec::new())).collect();

    for line in lines.skip(header_rows.saturating_sub(1)) {
        for (name, cell) in names.iter().zip(line.split(',')) {
            let cell = cell.trim();
            if !cell.is_empty() {
                if let Some(column) = map.get_mut(name) {
                    column.push(cell.to_string());
                }
            }
        }
    }
    Ok(map)
}

/// Units and cells of `key` inside one group.
fn group_cells(data: &SimData, key: &str) -> Result<(String, Vec<String>)> {
    if let Some(dataset) = data.get(key) {
        let cells = dataset.values.iter().flat_map(Value::cells).collect();
        return Ok((dataset.units.clone(), cells));
    }

    let parsed = Key::parse(key)?;
    match parsed.aggregation.filter(|a| a.is_statistic()) {
        Some(aggregation) => {
            let source = parsed.source().to_string();
            let dataset = data.get(&source).ok_or(Error::KeyNotFound(source))?;
            let cells = statistic_per_value(dataset, aggregation)
                .into_iter()
                .map(format_number)
                .collect();
            Ok((dataset.units.clone(), cells))
        }
        None => Err(Error::KeyNotFound(key.to_string())),
    }
}

fn header_cell(key: &str, units: &str) -> String {
    format!("{}[{}]", key, units)
}

fn write_table(
    path: &Path,
    delimiter: &str,
    header: Option<&[String]>,
    columns: &[Vec<String>],
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    if let Some(header) = header {
        writeln!(out, "{}", header.join(delimiter))?;
    }

    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        let cells: Vec<&str> = columns
            .iter()
            .map(|c| c.get(row).map(String::as_str).unwrap_or(""))
            .collect();
        writeln!(out, "{}", cells.join(delimiter))?;
    }

    out.flush()?;
    Ok(())
}
