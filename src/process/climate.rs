//! Seasonal climate matrices from POISE runs.

use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Key, KeyFilter, SimData, Value};

use super::output::{read_table, transpose};

/// Seasonal climate outputs written under `SeasonalClimateFiles/`.
pub const SEASONAL_FILES: [&str; 8] = [
    "DailyInsol",
    "PlanckB",
    "SeasonalDivF",
    "SeasonalFIn",
    "SeasonalFMerid",
    "SeasonalFOut",
    "SeasonalIceBalance",
    "SeasonalTemp",
];

/// Units of a seasonal climate output.
pub fn seasonal_units(name: &str) -> &'static str {
    match name {
        "DailyInsol" | "SeasonalFIn" | "SeasonalFOut" | "SeasonalDivF" => "W/m^2",
        "PlanckB" => "W/m^2/K",
        "SeasonalIceBalance" => "kg/m^2/s",
        "SeasonalTemp" => "deg C",
        "SeasonalFMerid" => "W",
        _ => "",
    }
}

/// Read `SeasonalClimateFiles/<prefix>.<name>.0` into `body:name`.
///
/// The matrix is stored transposed. Returns `false` if the file does not
/// exist.
pub fn process_seasonal_climate_file(
    folder: &Path,
    prefix: &str,
    body: &str,
    name: &str,
    data: &mut SimData,
    filter: &KeyFilter,
) -> Result<bool> {
    let key = Key::plain(body, name).to_string();
    if !filter.accepts(&key) {
        return Ok(true);
    }

    let path = folder
        .join("SeasonalClimateFiles")
        .join(format!("{}.{}.0", prefix, name));
    if !path.is_file() {
        return Ok(false);
    }
    log::debug!("Processing seasonal climate file {}", path.display());

    let rows = read_table(&path)?;
    let width = rows.first().map_or(0, |r| r.len());
    if let Some(idx) = rows.iter().position(|r| r.len() != width) {
        return Err(Error::Parse {
            path,
            line: idx + 1,
            message: format!("expected {} columns, found {}", width, rows[idx].len()),
        });
    }

    data.insert_value(key, seasonal_units(name), Value::Matrix(transpose(&rows)));
    Ok(true)
}
