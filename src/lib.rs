//! # bigplanet
//!
//! Aggregate, filter and extract the outputs of VPLanet parameter sweeps.
//!
//! A sweep is a folder holding one sub-directory per simulation. BigPlanet
//! reads every simulation's input files, log file and output tables and
//! stores them as an archive (`.bpa`, one group per simulation), or keeps
//! only selected keys in a filtered file (`.bpf`) or a VR Ulysses CSV.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bigplanet::{run, RunOptions};
//!
//! fn main() -> bigplanet::Result<()> {
//!     // Build the archive described by bpl.in on four threads
//!     let options = RunOptions::new().archive().with_cores(4);
//!     run("bpl.in", &options)?;
//!
//!     // Read a column back
//!     let file = bigplanet::open("sweep.bpa")?;
//!     let obliquity = bigplanet::extract_column(&file, "earth:Obliquity:final")?;
//!     println!("{:?}", obliquity.numbers());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Parallel archiving**: a rayon worker pool with a resumable checkpoint
//! - **Filtering**: selected keys from the archive, or straight from raw data
//! - **Statistics**: min, max, mean, mode, geometric mean, stddev and rms
//!   of any forward series
//! - **Integrity**: Fletcher-32 per group and an MD5 sidecar per file
//! - **Exports**: delimited text, Ulysses CSV and JSON

pub mod archive;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod input;
pub mod model;
pub mod options;
pub mod process;
pub mod status;
pub mod store;

// Re-export commonly used types
pub use archive::{
    create_archive, create_archive_with_progress, ArchiveSummary, StatusCounts, TrialOutcome,
};
pub use error::{Error, Result};
pub use export::{
    archive_to_csv, columns_to_json, csv_to_map, write_output, JsonFormat, OutputOptions,
};
pub use extract::{
    create_matrix, extract_column, extract_unique_values, extract_units, list_datasets, Column,
};
pub use filter::filter;
pub use input::BplInput;
pub use model::{Aggregation, Dataset, Key, KeyFilter, SimData, Value};
pub use options::{ErrorMode, RunMode, RunOptions};
pub use status::status;
pub use store::{BplFile, FileKind};

use std::fs;
use std::path::{Path, PathBuf};

use store::{md5_checksum, Md5Status};

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Archive built (or resumed)
    Archive(ArchiveSummary),
    /// Filtered file or Ulysses CSV written
    Filtered(PathBuf),
}

/// Read an input file and build what `options.mode` asks for.
///
/// # Example
///
/// ```no_run
/// use bigplanet::{run, RunOptions, RunOutcome};
///
/// match run("bpl.in", &RunOptions::new()).unwrap() {
///     RunOutcome::Filtered(path) => println!("Wrote {}", path.display()),
///     RunOutcome::Archive(summary) => println!("{} groups", summary.created),
/// }
/// ```
pub fn run<P: AsRef<Path>>(input_path: P, options: &RunOptions) -> Result<RunOutcome> {
    let input = BplInput::load(input_path)?;
    match options.mode {
        RunMode::Archive => create_archive(&input, options).map(RunOutcome::Archive),
        RunMode::Filter => filter(&input, options).map(RunOutcome::Filtered),
    }
}

/// Open an archive or filtered file, verifying its checksums.
pub fn open<P: AsRef<Path>>(path: P) -> Result<BplFile> {
    BplFile::open(path)
}

/// Delete the raw simulation folder of `input` once its archive is safe.
///
/// The archive must exist and match its MD5 sidecar (created when
/// missing); a mismatch is an error. The sweep folder and its
/// `.<folder>` marker file are removed.
pub fn delete_raw_data(input: &BplInput) -> Result<()> {
    let archive = input.archive_path();
    if !archive.is_file() {
        return Err(Error::InvalidInput(format!(
            "{} does not exist; create the archive before deleting raw data",
            archive.display()
        )));
    }

    if md5_checksum(&archive, false)? == Md5Status::Created {
        log::info!("Checksum recorded for {}", archive.display());
    }

    let folder = input.folder_path();
    log::info!("Deleting {}", folder.display());
    fs::remove_dir_all(&folder)?;

    let marker = input.marker_path();
    if marker.is_file() {
        fs::remove_file(marker)?;
    }
    Ok(())
}
