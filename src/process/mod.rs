//! Reading the outputs of one simulation.
//!
//! A simulation folder holds the input files, a log file, one evolution
//! table per body and, for climate runs, a climate table plus seasonal
//! matrices. [`gather_data`] reads all of them into a [`SimData`].

mod climate;
mod infile;
mod logfile;
mod output;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::input::{find_option, get_log_name, get_snames, VplanetHelp};
use crate::model::{Aggregation, Key, KeyFilter, SimData, Value};

pub use climate::{process_seasonal_climate_file, seasonal_units, SEASONAL_FILES};
pub use infile::{infile_units, process_input_file};
pub use logfile::{parse_log, parse_order, process_log_file};
pub use output::{parse_table, process_output_file, read_table};

/// Names shared by every simulation of a sweep.
#[derive(Debug, Clone)]
pub struct GatherContext {
    /// `sSystemName` of the primary file
    pub system_name: String,
    /// `sName` of each body file
    pub body_names: Vec<String>,
    /// Log file name inside each simulation folder
    pub log_file: String,
    /// Body files followed by the primary file
    pub infiles: Vec<String>,
    /// Option metadata for typing and units
    pub help: VplanetHelp,
}

impl GatherContext {
    /// Resolve names from the first simulation of `sims`.
    pub fn from_sims(infiles: Vec<String>, sims: &[PathBuf], help: VplanetHelp) -> Result<Self> {
        let (system_name, body_names) = get_snames(&infiles, sims)?;
        let log_file = get_log_name(&infiles, sims, &system_name)?;
        Ok(Self {
            system_name,
            body_names,
            log_file,
            infiles,
            help,
        })
    }

    /// The primary input file (last of the input files).
    pub fn primary_file(&self) -> &str {
        self.infiles.last().map(String::as_str).unwrap_or("vpl.in")
    }

    /// Input file of a body, matched by file stem.
    fn body_file(&self, body: &str) -> Option<&str> {
        self.infiles
            .iter()
            .map(String::as_str)
            .find(|f| f.split('.').next() == Some(body))
    }
}

/// Read every output of one simulation folder.
///
/// Only keys accepted by `filter` are kept, and output tables are skipped
/// when no key from them is wanted.
pub fn gather_data(ctx: &GatherContext, folder: &Path, filter: &KeyFilter) -> Result<SimData> {
    let mut data = SimData::new();
    let primary = ctx.primary_file();

    for infile in &ctx.infiles {
        process_input_file(folder, infile, primary, &ctx.help, &mut data, filter)?;
    }

    // Output orders name the table columns, so the log is read in full.
    let mut log_data = SimData::new();
    process_log_file(&folder.join(&ctx.log_file), &mut log_data, &KeyFilter::All)?;
    for (key, dataset) in &log_data {
        if filter.accepts(key) {
            data.insert_dataset(key.clone(), dataset.clone());
        }
    }

    for body in &ctx.body_names {
        if let Some(Value::Pairs(order)) = log_data.first_value(&Key::plain(body, "OutputOrder").to_string()) {
            match evolution_file(ctx, folder, body)? {
                Some((file, aggregation)) if wants(filter, body, aggregation) => {
                    process_output_file(&folder.join(file), &mut data, body, order, aggregation, filter)?;
                }
                Some(_) => {}
                None => log::warn!(
                    "{}: neither bDoForward nor bDoBackward set, skipping output of {}",
                    folder.display(),
                    body
                ),
            }
        }

        if let Some(Value::Pairs(order)) =
            log_data.first_value(&Key::plain(body, "GridOutputOrder").to_string())
        {
            if wants(filter, body, Aggregation::Climate) {
                let climate = folder.join(format!("{}.{}.Climate", ctx.system_name, body));
                process_output_file(&climate, &mut data, body, order, Aggregation::Climate, filter)?;
            }

            let prefix = format!("{}.{}", ctx.system_name, body);
            for name in SEASONAL_FILES {
                if !process_seasonal_climate_file(folder, &prefix, body, name, &mut data, filter)? {
                    log::warn!(
                        "{}: missing seasonal climate file {}.{}.0",
                        folder.display(),
                        prefix,
                        name
                    );
                }
            }
        }
    }

    Ok(data)
}

/// Evolution table of a body and whether it runs forward or backward.
fn evolution_file(
    ctx: &GatherContext,
    folder: &Path,
    body: &str,
) -> Result<Option<(String, Aggregation)>> {
    let primary = fs::read_to_string(folder.join(ctx.primary_file()))?;
    let enabled = |option: &str| find_option(&primary, option).is_some_and(|v| v != "0");

    let aggregation = if enabled("bDoForward") {
        Aggregation::Forward
    } else if enabled("bDoBackward") {
        Aggregation::Backward
    } else {
        return Ok(None);
    };

    let custom = match ctx.body_file(body) {
        Some(file) => {
            let content = fs::read_to_string(folder.join(file))?;
            find_option(&content, "sOutFile")
        }
        None => None,
    };
    let file = custom.unwrap_or_else(|| format!("{}.{}.{}", ctx.system_name, body, aggregation));
    Ok(Some((file, aggregation)))
}

/// Whether any key of `body` read from an `aggregation` table is wanted.
fn wants(filter: &KeyFilter, body: &str, aggregation: Aggregation) -> bool {
    match filter {
        KeyFilter::Include(keys) => keys
            .iter()
            .filter_map(|k| Key::parse(k).ok())
            .any(|k| k.body == body && k.source().aggregation == Some(aggregation)),
        _ => true,
    }
}
