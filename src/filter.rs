//! Filtered files: selected keys aggregated over every simulation.
//!
//! When the archive exists the selected columns are read from it. Otherwise
//! the raw simulation folders are read, keeping only the files and keys the
//! selection needs.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::export::{archive_to_csv, data_to_csv};
use crate::extract::{extract_column, extract_units, statistic_per_value};
use crate::input::{get_sims, BplInput};
use crate::model::{Dataset, Key, KeyFilter, SimData, Value};
use crate::options::RunOptions;
use crate::process::{gather_data, GatherContext};
use crate::store::{md5_path, write_filtered, BplFile};

/// Keys grouped by the simulation file they are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyGroups {
    /// Log file: initial and final values, output options
    pub log: Vec<String>,
    /// Input files
    pub option: Vec<String>,
    /// Forward evolution files, including statistics
    pub forward: Vec<String>,
    /// Climate tables and seasonal matrices
    pub climate: Vec<String>,
    /// Backward evolution files
    pub backward: Vec<String>,
}

impl KeyGroups {
    /// Whether no key was sorted into any group.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
            && self.option.is_empty()
            && self.forward.is_empty()
            && self.climate.is_empty()
            && self.backward.is_empty()
    }
}

/// Sort keys by the file kind holding their data.
///
/// The last `:` segment decides: two-part keys other than output orders
/// are seasonal climate matrices.
pub fn split_keys<S: AsRef<str>>(keys: &[S]) -> KeyGroups {
    let mut groups = KeyGroups::default();
    for key in keys {
        let key = key.as_ref();
        let suffix = key.rsplit(':').next().unwrap_or(key);
        let target = match suffix {
            "initial" | "final" | "OutputOption" | "GridOutputOption" | "OutputOrder"
            | "GridOutputOrder" => &mut groups.log,
            "forward" | "mean" | "mode" | "max" | "min" | "geomean" | "stddev" | "rms" => {
                &mut groups.forward
            }
            "option" => &mut groups.option,
            "backward" => &mut groups.backward,
            _ => &mut groups.climate,
        };
        target.push(key.to_string());
    }

    log::debug!("Log file: {:?}", groups.log);
    log::debug!("Body file: {:?}", groups.option);
    log::debug!("Forward file: {:?}", groups.forward);
    log::debug!("Climate file: {:?}", groups.climate);
    log::debug!("Backward file: {:?}", groups.backward);
    groups
}

/// Build the filtered file (or `User.csv`) described by `input`.
///
/// Returns the path written.
pub fn filter(input: &BplInput, options: &RunOptions) -> Result<PathBuf> {
    let output = input.output_path();
    if output.exists() && !input.ulysses {
        if !options.overwrite {
            return Err(Error::OutputExists(output));
        }
        log::info!("Overwriting {}", output.display());
        fs::remove_file(&output)?;
        let sidecar = md5_path(&output);
        if sidecar.is_file() {
            fs::remove_file(sidecar)?;
        }
    }

    let archive = input.archive_path();
    if archive.is_file() {
        log::info!("Extracting data from {}", archive.display());
        let file = BplFile::open_with_mode(&archive, options.error_mode)?;
        let keys = selected_keys(input, &file)?;
        return if input.ulysses {
            archive_to_csv(&file, &keys, &output, input.sim_name.as_deref())
        } else {
            archive_to_filtered(&file, &keys, &output)
        };
    }

    log::warn!(
        "{} does not exist. Obtaining data from {}, this may take some time",
        archive.display(),
        input.dest_folder
    );
    if !input.has_key_list() {
        return Err(Error::InvalidInput(
            "saKeyInclude or saKeyExclude is required without an archive".to_string(),
        ));
    }

    let data = filter_raw(input, options)?;
    if input.ulysses {
        data_to_csv(&data, &output)
    } else {
        write_filtered(&output, &data)
    }
}

/// Write the columns of `keys` as a filtered file.
///
/// Statistics are computed from the archived forward series.
pub fn archive_to_filtered<S: AsRef<str>>(file: &BplFile, keys: &[S], out: &Path) -> Result<PathBuf> {
    let mut data = SimData::new();
    for key in keys {
        let key = key.as_ref();
        log::debug!("Dataset: {}", key);
        let units = extract_units(file, key)?;
        data.insert_dataset(key, extract_column(file, key)?.into_dataset(&units));
    }
    write_filtered(out, &data)
}

/// Keys to extract from an archive.
fn selected_keys(input: &BplInput, file: &BplFile) -> Result<Vec<String>> {
    if !input.include.is_empty() {
        return Ok(input.include.clone());
    }
    if !input.exclude.is_empty() {
        let first = file
            .first_group()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no groups", file.path().display())))?;
        return Ok(first
            .keys()
            .filter(|k| !input.exclude.iter().any(|e| e == k))
            .map(String::from)
            .collect());
    }
    Err(Error::InvalidInput(
        "saKeyInclude or saKeyExclude is required to filter an archive".to_string(),
    ))
}

/// Read the selected keys straight from the simulation folders.
fn filter_raw(input: &BplInput, options: &RunOptions) -> Result<SimData> {
    let sims = get_sims(&input.folder_path(), input.sim_name.as_deref())?;
    let ctx = GatherContext::from_sims(input.infiles()?, &sims, options.resolve_help())?;

    let key_filter = if input.include.is_empty() {
        KeyFilter::Exclude(input.exclude.clone())
    } else {
        let groups = split_keys(&input.include);
        if groups.is_empty() {
            return Err(Error::InvalidInput("No keys to filter".to_string()));
        }
        let mut sources = Vec::new();
        for key in &input.include {
            let source = Key::parse(key)?.source().to_string();
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        KeyFilter::Include(sources)
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.cores)
        .build()
        .map_err(|e| Error::Other(format!("Failed to start worker pool: {}", e)))?;

    let lenient = options.is_lenient();
    let gathered: Vec<Option<SimData>> = pool.install(|| {
        sims.par_iter()
            .map(|sim| match gather_data(&ctx, sim, &key_filter) {
                Ok(data) => Ok(Some(data)),
                Err(e) if lenient => {
                    log::warn!("Skipping {}: {}", sim.display(), e);
                    Ok(None)
                }
                Err(e) => Err(e),
            })
            .collect::<Result<_>>()
    })?;

    let mut data = SimData::new();
    for sim in gathered.into_iter().flatten() {
        data.merge(sim);
    }

    if !input.include.is_empty() {
        add_statistics(&mut data, &input.include)?;
        data.retain(|k| input.include.iter().any(|i| i == k));
    }
    Ok(data)
}

/// Compute requested statistics from the aggregated forward series.
fn add_statistics(data: &mut SimData, keys: &[String]) -> Result<()> {
    for key in keys {
        let parsed = Key::parse(key)?;
        let Some(aggregation) = parsed.aggregation.filter(|a| a.is_statistic()) else {
            continue;
        };
        let source = parsed.source().to_string();
        let dataset = data
            .get(&source)
            .ok_or_else(|| Error::KeyNotFound(source.clone()))?;
        let values = statistic_per_value(dataset, aggregation)
            .into_iter()
            .map(Value::Number)
            .collect();
        let stats = Dataset {
            units: dataset.units.clone(),
            values,
        };
        data.insert_dataset(key.clone(), stats);
    }
    Ok(())
}
