//! Extracting columns, units and statistics from BigPlanet files.
//!
//! A column gathers the values of one key over every group of an archive
//! (one entry per simulation), or the aggregated values of the root group
//! of a filtered file.

mod matrix;
pub mod stats;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{format_number, Aggregation, Dataset, Key, SimData, Value};
use crate::store::BplFile;

pub use matrix::{create_matrix, rotate_clockwise};

/// Values of one key across a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    /// Scalars: log values, options, statistics
    Numbers(Vec<f64>),
    /// One time series per simulation
    Series(Vec<Vec<f64>>),
    /// Non-numeric option values
    Text(Vec<String>),
    /// Output order entries
    Pairs(Vec<(String, String)>),
    /// One seasonal matrix per simulation
    Matrices(Vec<Vec<Vec<f64>>>),
}

impl Column {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Column::Numbers(v) => v.len(),
            Column::Series(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Pairs(v) => v.len(),
            Column::Matrices(v) => v.len(),
        }
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All numbers in the column, flattened.
    pub fn numbers(&self) -> Vec<f64> {
        match self {
            Column::Numbers(v) => v.clone(),
            Column::Series(v) => v.iter().flatten().copied().collect(),
            Column::Text(v) => v.iter().filter_map(|s| crate::model::parse_number(s)).collect(),
            Column::Pairs(_) => Vec::new(),
            Column::Matrices(v) => v.iter().flatten().flatten().copied().collect(),
        }
    }

    /// Text cells for delimited output, flattened.
    pub fn cells(&self) -> Vec<String> {
        match self {
            Column::Text(v) => v.clone(),
            Column::Pairs(v) => v.iter().map(|(n, u)| format!("{}[{}]", n, u)).collect(),
            _ => self.numbers().into_iter().map(format_number).collect(),
        }
    }

    /// Store the column as a dataset, one value per entry.
    pub fn into_dataset(self, units: &str) -> Dataset {
        let values = match self {
            Column::Numbers(v) => v.into_iter().map(Value::Number).collect(),
            Column::Series(v) => v.into_iter().map(Value::Series).collect(),
            Column::Text(v) => v.into_iter().map(Value::Text).collect(),
            Column::Pairs(v) => vec![Value::Pairs(v)],
            Column::Matrices(v) => v.into_iter().map(Value::Matrix).collect(),
        };
        Dataset {
            units: units.to_string(),
            values,
        }
    }
}

/// Extract the column of `key` from every group of `file`.
///
/// Statistics (`mean`, `stddev`, ...) are computed per simulation from the
/// key's forward series unless the file stores them directly.
///
/// # Example
/// ```no_run
/// use bigplanet::extract::extract_column;
/// use bigplanet::store::BplFile;
///
/// let file = BplFile::open("sweep.bpa").unwrap();
/// let obliquity = extract_column(&file, "earth:Obliquity:final").unwrap();
/// println!("{} values", obliquity.len());
/// ```
pub fn extract_column(file: &BplFile, key: &str) -> Result<Column> {
    let parsed = Key::parse(key)?;

    if parsed.is_order() {
        return file
            .iter()
            .find_map(|(_, g)| match g.first_value(key) {
                Some(Value::Pairs(p)) => Some(Column::Pairs(p.clone())),
                _ => None,
            })
            .ok_or_else(|| Error::KeyNotFound(key.to_string()));
    }

    if let Some(agg) = parsed.aggregation.filter(|a| a.is_statistic()) {
        let source = parsed.source().to_string();
        let mut numbers = Vec::new();
        for (name, group) in file.iter() {
            if let Some(stored) = group.get(key) {
                numbers.extend(stored.values.iter().filter_map(Value::as_f64));
                continue;
            }
            let dataset = require(group, &source, name)?;
            numbers.extend(statistic_per_value(dataset, agg));
        }
        return Ok(Column::Numbers(numbers));
    }

    let mut values: Vec<&Value> = Vec::new();
    for (name, group) in file.iter() {
        values.extend(require(group, key, name)?.values.iter());
    }
    Ok(collect_column(&values))
}

/// Units of `key`, taken from the first group holding it.
///
/// Statistics report the units of their forward series.
pub fn extract_units(file: &BplFile, key: &str) -> Result<String> {
    let parsed = Key::parse(key)?;
    let source = parsed.source().to_string();
    file.iter()
        .find_map(|(_, g)| g.get(key).or_else(|| g.get(&source)))
        .map(|ds| ds.units.clone())
        .ok_or_else(|| Error::KeyNotFound(key.to_string()))
}

/// Sorted unique numbers of a column.
pub fn extract_unique_values(file: &BplFile, key: &str) -> Result<Vec<f64>> {
    let mut values = extract_column(file, key)?.numbers();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup_by(|a, b| a.total_cmp(b).is_eq());
    Ok(values)
}

/// Dataset names of the first group, plus the statistics derivable from
/// each forward or climate series.
pub fn list_datasets(file: &BplFile) -> Vec<String> {
    let Some(group) = file.first_group() else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for key in group.keys() {
        names.push(key.to_string());
        let Ok(parsed) = Key::parse(key) else {
            continue;
        };
        if matches!(parsed.aggregation, Some(Aggregation::Forward) | Some(Aggregation::Climate)) {
            for stat in Aggregation::STATISTICS {
                names.push(parsed.with_aggregation(stat).to_string());
            }
        }
    }
    names
}

/// Aggregate a statistic per series of a dataset.
pub(crate) fn statistic_per_value(dataset: &Dataset, aggregation: Aggregation) -> Vec<f64> {
    dataset
        .values
        .iter()
        .filter_map(|v| stats::compute(aggregation, &v.flatten()))
        .collect()
}

fn require<'a>(group: &'a SimData, key: &str, group_name: &str) -> Result<&'a Dataset> {
    group
        .get(key)
        .ok_or_else(|| Error::KeyNotFound(format!("{} (group {})", key, group_name)))
}

fn collect_column(values: &[&Value]) -> Column {
    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Series(_))) {
        return Column::Series(values.iter().filter_map(|v| v.as_series().map(<[f64]>::to_vec)).collect());
    }
    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Matrix(_))) {
        return Column::Matrices(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Matrix(m) => Some(m.clone()),
                    _ => None,
                })
                .collect(),
        );
    }
    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.as_f64()).collect();
    match numbers {
        Some(n) => Column::Numbers(n),
        None => Column::Text(values.iter().flat_map(|v| v.cells()).collect()),
    }
}
