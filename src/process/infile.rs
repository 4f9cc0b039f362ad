//! Body and primary input files.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::input::{find_option, option_lines, VplanetHelp};
use crate::model::{Aggregation, Key, KeyFilter, SimData, Value};

/// Dimension names and the option selecting their unit.
const UNIT_OPTIONS: [(&str, &str); 5] = [
    ("length", "sUnitLength"),
    ("angle", "sUnitAngle"),
    ("temperature", "sUnitTemp"),
    ("mass", "sUnitMass"),
    ("time", "sUnitTime"),
];

/// Parse one input file of a simulation into `body:Option:option` keys.
///
/// The body name is the file stem (`earth.in` -> `earth`). `primary` is
/// the primary input file name, consulted for units.
pub fn process_input_file(
    folder: &Path,
    infile: &str,
    primary: &str,
    help: &VplanetHelp,
    data: &mut SimData,
    filter: &KeyFilter,
) -> Result<()> {
    let path = folder.join(infile);
    log::debug!("Processing input file {}", path.display());
    let content = fs::read_to_string(&path)?;
    let primary_content = if infile == primary {
        content.clone()
    } else {
        fs::read_to_string(folder.join(primary)).unwrap_or_default()
    };

    let body = infile.split('.').next().unwrap_or(infile);

    for line in option_lines(&content) {
        let Some(raw_value) = line.first_value() else {
            continue;
        };
        let option = line.name().replace('-', "");
        let key = Key::new(body, option.as_str(), Aggregation::Option).to_string();
        if !filter.accepts(&key) {
            continue;
        }

        let units = infile_units(&option, raw_value, &content, &primary_content, help);
        let value = if option == "saOutputOrder" || option == "saGridOutput" {
            Value::Text(raw_value.trim_start_matches('-').to_string())
        } else if help.is_string(&option) {
            Value::Text(raw_value.to_string())
        } else {
            Value::from_token(raw_value)
        };
        data.insert_value(key, &units, value);
    }
    Ok(())
}

/// Units of an input option value.
///
/// A negative value selects the option's custom unit. Otherwise the option
/// dimension is resolved with the `sUnit*` options of the input file, then
/// the primary file, then VPLanet's defaults.
pub fn infile_units(
    option: &str,
    value: &str,
    infile: &str,
    primary: &str,
    help: &VplanetHelp,
) -> String {
    let meta = help.get(option);

    if value.starts_with('-') {
        if let Some(unit) = meta.and_then(|m| m.custom_unit.as_deref()) {
            return unit.to_string();
        }
    }

    let dimension = match meta.and_then(|m| m.dimension.as_deref()) {
        None | Some("nd") | Some("") => return "nd".to_string(),
        Some(d) => d,
    };

    let mut units = dimension
        .replace("pressure", "(mass*length^-1*time^-2)")
        .replace("energy", "(mass*length^2*time^-2)");

    for content in [infile, primary] {
        for (dim, unit_option) in UNIT_OPTIONS {
            if units.contains(dim) {
                if let Some(unit) = find_option(content, unit_option) {
                    units = units.replace(dim, &unit);
                }
            }
        }
    }

    for (dim, unit_option) in UNIT_OPTIONS {
        if units.contains(dim) {
            if let Some(unit) = help.default_value(unit_option) {
                units = units.replace(dim, unit);
            }
        }
    }

    units
}
