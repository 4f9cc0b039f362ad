//! VPLanet log files: initial/final properties and output orders.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::model::{Aggregation, Key, KeyFilter, SimData, Value};

lazy_static! {
    /// `(Param) Description [units]: value`
    static ref PROPERTY_LINE: Regex =
        Regex::new(r"^\(([^)]*)\)(.*?)(?:\[([^\]]*)\])?\s*:\s*(.*)$")
            .expect("PROPERTY_LINE regex is valid");
}

/// Parse a log file into `data`.
pub fn process_log_file(path: &Path, data: &mut SimData, filter: &KeyFilter) -> Result<()> {
    log::debug!("Processing log file {}", path.display());
    let bytes = fs::read(path)?;
    parse_log(&String::from_utf8_lossy(&bytes), data, filter);
    Ok(())
}

/// Parse log file content into `data`.
pub fn parse_log(content: &str, data: &mut SimData, filter: &KeyFilter) {
    let mut phase = Aggregation::Initial;
    let mut body = String::from("system");

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('-') {
            let section = line.trim_matches(|c: char| c == '-' || c.is_whitespace());
            if section.starts_with("INITIAL SYSTEM PROPERTIES") {
                phase = Aggregation::Initial;
                body = String::from("system");
            } else if section.starts_with("FINAL SYSTEM PROPERTIES") {
                phase = Aggregation::Final;
                body = String::from("system");
            } else if let Some(name) = section.strip_prefix("BODY:") {
                body = name.trim().to_string();
            }
            continue;
        }

        if let Some(caps) = PROPERTY_LINE.captures(line) {
            let param = caps[1].trim();
            let units = caps
                .get(3)
                .map(|m| m.as_str().trim())
                .filter(|u| !u.is_empty())
                .unwrap_or("nd");
            let value = caps[4].trim();
            let key = Key::new(body.as_str(), param, phase).to_string();
            if filter.accepts(&key) {
                data.insert_value(key, units, Value::from_token(value));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("Grid Output Order") {
            insert_order(rest, &body, "GridOutputOrder", Aggregation::Climate, data, filter);
        } else if let Some(rest) = line.strip_prefix("Output Order") {
            insert_order(rest, &body, "OutputOrder", Aggregation::Forward, data, filter);
        }
    }
}

/// Split `Var [u] Var2 [u2]` into (variable, units) pairs.
pub fn parse_order(list: &str) -> Vec<(String, String)> {
    list.split(']')
        .filter_map(|chunk| {
            let (var, units) = match chunk.split_once('[') {
                Some((var, units)) => (var.trim(), units.trim()),
                None => (chunk.trim(), ""),
            };
            if var.is_empty() {
                return None;
            }
            let units = if units.is_empty() { "nd" } else { units };
            Some((var.to_string(), units.to_string()))
        })
        .collect()
}

fn insert_order(
    rest: &str,
    body: &str,
    name: &str,
    aggregation: Aggregation,
    data: &mut SimData,
    filter: &KeyFilter,
) {
    let Some((_, list)) = rest.split_once(':') else {
        return;
    };
    let pairs = parse_order(list);
    if pairs.is_empty() {
        return;
    }

    for (var, units) in &pairs {
        let key = Key::new(body, var.as_str(), aggregation).to_string();
        if filter.accepts(&key) {
            data.insert_units(key, units);
        }
    }

    let key = Key::plain(body, name).to_string();
    if filter.accepts(&key) && !data.contains(&key) {
        data.insert_value(key, "", Value::Pairs(pairs));
    }
}
