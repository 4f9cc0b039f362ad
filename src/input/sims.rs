//! Sweep discovery: simulation folders, system and body names.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::lines::{find_option, option_lines};

/// List simulation folders, sorted, as absolute paths.
///
/// Files in the folder are ignored. With `name_filter`, only folders whose
/// name contains it are returned.
pub fn get_sims(folder: &Path, name_filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(Error::FolderNotFound(folder.to_path_buf()));
    }
    let folder = fs::canonicalize(folder)?;

    let mut sims = Vec::new();
    for entry in fs::read_dir(&folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(filter) = name_filter {
            if !entry.file_name().to_string_lossy().contains(filter) {
                continue;
            }
        }
        sims.push(entry.path());
    }
    sims.sort();
    Ok(sims)
}

/// Read the system name and body names from the first simulation.
///
/// The system name comes from the file defining `sSystemName` (normally
/// `vpl.in`); each other input file contributes its `sName`.
pub fn get_snames(infiles: &[String], sims: &[PathBuf]) -> Result<(String, Vec<String>)> {
    let first = first_sim(sims)?;
    let mut system_name = None;
    let mut body_names = Vec::new();

    for file in infiles {
        let content = fs::read_to_string(first.join(file))?;
        for line in option_lines(&content) {
            match (line.name(), line.first_value()) {
                ("sSystemName", Some(name)) => system_name = Some(name.to_string()),
                ("sName", Some(name)) => body_names.push(name.to_string()),
                _ => {}
            }
        }
    }

    let system_name =
        system_name.ok_or_else(|| Error::MissingOption("sSystemName".to_string()))?;
    log::debug!("System name: {}", system_name);
    log::debug!("Body names: {:?}", body_names);
    Ok((system_name, body_names))
}

/// Name of the log file: `sLogFile` if an input file sets it, else
/// `<system>.log`.
pub fn get_log_name(infiles: &[String], sims: &[PathBuf], system_name: &str) -> Result<String> {
    let first = first_sim(sims)?;
    for file in infiles {
        let content = fs::read_to_string(first.join(file))?;
        if let Some(name) = find_option(&content, "sLogFile") {
            return Ok(name);
        }
    }
    Ok(format!("{}.log", system_name))
}

fn first_sim(sims: &[PathBuf]) -> Result<&PathBuf> {
    sims.first()
        .ok_or_else(|| Error::InvalidInput("no simulation folders found".to_string()))
}
