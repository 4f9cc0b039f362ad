//! Parallel archive creation.
//!
//! Workers on a rayon pool repeatedly claim the next pending simulation
//! from the [`Checkpoint`], gather its data, and append it to the archive
//! as one group. Interrupted runs resume from the checkpoint.

mod checkpoint;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Sender;

use crate::error::{Error, Result};
use crate::input::{get_sims, BplInput};
use crate::model::KeyFilter;
use crate::options::RunOptions;
use crate::process::{gather_data, GatherContext};
use crate::store::{md5_path, ArchiveWriter, FileKind};

pub use checkpoint::{group_name, Checkpoint, Recovery, SimStatus, StatusCounts};

/// Result of processing one simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Group written
    Created(String),
    /// Group already in the archive
    Skipped(String),
    /// Reading or writing failed; the simulation stays in progress
    Failed {
        /// Group name
        group: String,
        /// Error message
        error: String,
    },
}

impl TrialOutcome {
    /// Group name the outcome refers to.
    pub fn group(&self) -> &str {
        match self {
            TrialOutcome::Created(g) | TrialOutcome::Skipped(g) => g,
            TrialOutcome::Failed { group, .. } => group,
        }
    }
}

/// Summary of an archive run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Archive path
    pub archive: PathBuf,
    /// Groups written in this run
    pub created: usize,
    /// Groups that already existed
    pub skipped: usize,
    /// Simulations that failed
    pub failed: usize,
}

impl ArchiveSummary {
    fn record(&mut self, outcome: &TrialOutcome) {
        match outcome {
            TrialOutcome::Created(_) => self.created += 1,
            TrialOutcome::Skipped(_) => self.skipped += 1,
            TrialOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Whether every simulation made it into the archive.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Build the archive described by `input`.
pub fn create_archive(input: &BplInput, options: &RunOptions) -> Result<ArchiveSummary> {
    create_archive_with_progress(input, options, |_| {})
}

/// Build the archive, reporting each simulation as it finishes.
pub fn create_archive_with_progress<F>(
    input: &BplInput,
    options: &RunOptions,
    mut progress: F,
) -> Result<ArchiveSummary>
where
    F: FnMut(&TrialOutcome),
{
    let sims = get_sims(&input.folder_path(), None)?;
    let ctx = GatherContext::from_sims(input.infiles()?, &sims, options.resolve_help())?;

    let archive_path = input.archive_path();
    let checkpoint_path = input.checkpoint_path();
    let checkpoint = prepare_checkpoint(input, &checkpoint_path, &archive_path, &sims, options.overwrite)?;

    let writer = ArchiveWriter::open_or_create(&archive_path, FileKind::Archive)?;
    log::info!(
        "Archiving {} simulations into {} on {} threads",
        sims.len(),
        archive_path.display(),
        options.cores
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.cores)
        .build()
        .map_err(|e| Error::Other(format!("Failed to start worker pool: {}", e)))?;

    let checkpoint = Mutex::new(checkpoint);
    let writer = Mutex::new(writer);
    let mut summary = ArchiveSummary {
        archive: archive_path.clone(),
        ..ArchiveSummary::default()
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    pool.in_place_scope(|scope| {
        let ctx = &ctx;
        let checkpoint = &checkpoint;
        let writer = &writer;
        for _ in 0..options.cores {
            let tx = tx.clone();
            scope.spawn(move |_| worker(ctx, checkpoint, writer, tx));
        }
        drop(tx);

        for outcome in rx {
            match &outcome {
                TrialOutcome::Created(group) => log::debug!("Created {}", group),
                TrialOutcome::Skipped(group) => log::debug!("{} already archived", group),
                TrialOutcome::Failed { group, error } => log::error!("{}: {}", group, error),
            }
            progress(&outcome);
            summary.record(&outcome);
        }
    });

    let writer = writer.into_inner().unwrap_or_else(PoisonError::into_inner);
    writer.finish()?;

    log::info!(
        "Archive {}: {} created, {} skipped, {} failed",
        archive_path.display(),
        summary.created,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

fn prepare_checkpoint(
    input: &BplInput,
    checkpoint_path: &Path,
    archive_path: &Path,
    sims: &[PathBuf],
    overwrite: bool,
) -> Result<Checkpoint> {
    if checkpoint_path.is_file() {
        let mut checkpoint = Checkpoint::load(checkpoint_path)?;
        checkpoint.recover(archive_path, overwrite)?;
        let added = checkpoint.add_missing(sims)?;
        if added > 0 {
            log::info!("{} new simulations added to the checkpoint", added);
        }
        return Ok(checkpoint);
    }

    if overwrite && archive_path.is_file() {
        log::info!("Overwriting {}", archive_path.display());
        fs::remove_file(archive_path)?;
        let sidecar = md5_path(archive_path);
        if sidecar.is_file() {
            fs::remove_file(sidecar)?;
        }
    }

    let source = fs::canonicalize(&input.source).unwrap_or_else(|_| input.source.clone());
    Checkpoint::create(checkpoint_path, &source, sims)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn worker(
    ctx: &GatherContext,
    checkpoint: &Mutex<Checkpoint>,
    writer: &Mutex<ArchiveWriter>,
    tx: Sender<TrialOutcome>,
) {
    loop {
        let next = lock(checkpoint).next_pending();
        let sim = match next {
            Ok(Some(sim)) => sim,
            Ok(None) => return,
            Err(e) => {
                let _ = tx.send(TrialOutcome::Failed {
                    group: "checkpoint".to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };

        let outcome = process_trial(ctx, writer, &sim);
        if !matches!(outcome, TrialOutcome::Failed { .. }) {
            if let Err(e) = lock(checkpoint).mark_complete(&sim) {
                let _ = tx.send(TrialOutcome::Failed {
                    group: group_name(&sim),
                    error: e.to_string(),
                });
                return;
            }
        }

        if tx.send(outcome).is_err() {
            return;
        }
    }
}

fn process_trial(ctx: &GatherContext, writer: &Mutex<ArchiveWriter>, sim: &Path) -> TrialOutcome {
    let group = group_name(sim);
    if lock(writer).contains_group(&group) {
        return TrialOutcome::Skipped(group);
    }

    let written = gather_data(ctx, sim, &KeyFilter::All)
        .and_then(|data| lock(writer).write_group(&group, &data));
    match written {
        Ok(()) => TrialOutcome::Created(group),
        Err(e) => TrialOutcome::Failed {
            group,
            error: e.to_string(),
        },
    }
}
