//! JSON export of extracted columns.

use serde::Serialize;

use crate::error::Result;
use crate::extract::{extract_column, extract_units, Column};
use crate::store::BplFile;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct JsonColumn<'a> {
    key: &'a str,
    units: String,
    values: Column,
}

/// Convert the columns of `keys` to a JSON array of
/// `{ "key", "units", "values" }` objects.
pub fn columns_to_json<S: AsRef<str>>(file: &BplFile, keys: &[S], format: JsonFormat) -> Result<String> {
    let columns = keys
        .iter()
        .map(|key| {
            let key = key.as_ref();
            Ok(JsonColumn {
                key,
                units: extract_units(file, key)?,
                values: extract_column(file, key)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&columns)?,
        JsonFormat::Compact => serde_json::to_string(&columns)?,
    };
    Ok(json)
}
