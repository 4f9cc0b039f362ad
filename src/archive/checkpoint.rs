//! Resumable progress file for archive creation.
//!
//! ```text
//! Vspace File: /abs/path/bpl.in
//! Total Number of Simulations: 2
//! /abs/path/sweep/sim_00 1
//! /abs/path/sweep/sim_01 -1
//! THE END
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::store::{md5_path, ArchiveWriter};

const INPUT_PREFIX: &str = "Vspace File:";
const TOTAL_PREFIX: &str = "Total Number of Simulations:";
const END_MARKER: &str = "THE END";

/// Progress of one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    /// Not started (`-1`)
    Pending,
    /// Claimed by a worker (`0`)
    InProgress,
    /// Stored in the archive (`1`)
    Complete,
}

impl SimStatus {
    fn code(self) -> &'static str {
        match self {
            SimStatus::Pending => "-1",
            SimStatus::InProgress => "0",
            SimStatus::Complete => "1",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "-1" => Some(SimStatus::Pending),
            "0" => Some(SimStatus::InProgress),
            "1" => Some(SimStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Simulation counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Stored in the archive
    pub completed: usize,
    /// Claimed but not finished
    pub in_progress: usize,
    /// Not started
    pub remaining: usize,
}

impl StatusCounts {
    /// Total number of simulations.
    pub fn total(&self) -> usize {
        self.completed + self.in_progress + self.remaining
    }
}

/// What [`Checkpoint::recover`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Interrupted simulations were reset to pending
    Resumed {
        /// Number of simulations reset
        reset: usize,
    },
    /// Everything was complete; archive and checkpoint were recreated
    Restarted,
}

/// Checkpoint file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    path: PathBuf,
    input: PathBuf,
    entries: Vec<(PathBuf, SimStatus)>,
}

impl Checkpoint {
    /// Create a checkpoint with every simulation pending and save it.
    pub fn create(path: &Path, input: &Path, sims: &[PathBuf]) -> Result<Self> {
        let checkpoint = Self {
            path: path.to_path_buf(),
            input: input.to_path_buf(),
            entries: sims.iter().map(|s| (s.clone(), SimStatus::Pending)).collect(),
        };
        checkpoint.save()?;
        Ok(checkpoint)
    }

    /// Read a checkpoint file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let bad = |line: usize, msg: &str| {
            Error::Checkpoint(format!("{} line {}: {}", path.display(), line, msg))
        };

        let mut lines = content.lines().enumerate();
        let input = match lines.next() {
            Some((_, line)) => line
                .strip_prefix(INPUT_PREFIX)
                .map(|s| PathBuf::from(s.trim()))
                .ok_or_else(|| bad(1, "expected input file line"))?,
            None => return Err(bad(1, "empty checkpoint")),
        };
        let total: usize = match lines.next() {
            Some((_, line)) => line
                .strip_prefix(TOTAL_PREFIX)
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| bad(2, "expected simulation count"))?,
            None => return Err(bad(2, "missing simulation count")),
        };

        let mut entries = Vec::with_capacity(total);
        for (idx, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == END_MARKER {
                break;
            }
            let (sim, code) = line
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| bad(idx + 1, "expected `<folder> <status>`"))?;
            let status =
                SimStatus::from_code(code).ok_or_else(|| bad(idx + 1, "unknown status"))?;
            entries.push((PathBuf::from(sim.trim()), status));
        }

        if entries.len() != total {
            log::warn!(
                "{} lists {} simulations but declares {}",
                path.display(),
                entries.len(),
                total
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            input,
            entries,
        })
    }

    /// Write the checkpoint file.
    pub fn save(&self) -> Result<()> {
        let mut out = format!(
            "{} {}\n{} {}\n",
            INPUT_PREFIX,
            self.input.display(),
            TOTAL_PREFIX,
            self.entries.len()
        );
        for (sim, status) in &self.entries {
            out.push_str(&format!("{} {}\n", sim.display(), status));
        }
        out.push_str(END_MARKER);
        out.push('\n');
        fs::write(&self.path, out)?;
        Ok(())
    }

    /// Path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Input file recorded in the checkpoint.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Status of one simulation.
    pub fn status(&self, sim: &Path) -> Option<SimStatus> {
        self.entries
            .iter()
            .find(|(s, _)| s == sim)
            .map(|(_, status)| *status)
    }

    /// Claim the first pending simulation, marking it in progress.
    pub fn next_pending(&mut self) -> Result<Option<PathBuf>> {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(_, status)| *status == SimStatus::Pending)
        else {
            return Ok(None);
        };
        entry.1 = SimStatus::InProgress;
        let sim = entry.0.clone();
        self.save()?;
        Ok(Some(sim))
    }

    /// Mark a simulation complete.
    pub fn mark_complete(&mut self, sim: &Path) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(s, _)| s == sim)
            .ok_or_else(|| Error::Checkpoint(format!("{} is not in the checkpoint", sim.display())))?;
        entry.1 = SimStatus::Complete;
        self.save()
    }

    /// Add simulations missing from the checkpoint as pending.
    pub fn add_missing(&mut self, sims: &[PathBuf]) -> Result<usize> {
        let mut added = 0;
        for sim in sims {
            if self.status(sim).is_none() {
                self.entries.push((sim.clone(), SimStatus::Pending));
                added += 1;
            }
        }
        if added > 0 {
            self.save()?;
        }
        Ok(added)
    }

    /// Counts by status.
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for (_, status) in &self.entries {
            match status {
                SimStatus::Complete => counts.completed += 1,
                SimStatus::InProgress => counts.in_progress += 1,
                SimStatus::Pending => counts.remaining += 1,
            }
        }
        counts
    }

    /// Whether every simulation is complete.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, s)| *s == SimStatus::Complete)
    }

    /// Prepare an existing checkpoint for another run.
    ///
    /// Interrupted simulations go back to pending and their partial groups
    /// are removed from the archive. If everything is complete, `force`
    /// deletes the archive and starts over; otherwise
    /// `Error::AlreadyComplete` is returned.
    pub fn recover(&mut self, archive: &Path, force: bool) -> Result<Recovery> {
        if !self.entries.is_empty() && self.is_complete() {
            log::info!("All groups exist in {}", archive.display());
            if !force {
                return Err(Error::AlreadyComplete(archive.to_path_buf()));
            }
            if archive.is_file() {
                log::info!("Deleting {}", archive.display());
                fs::remove_file(archive)?;
            }
            let sidecar = md5_path(archive);
            if sidecar.is_file() {
                fs::remove_file(sidecar)?;
            }
            for entry in &mut self.entries {
                entry.1 = SimStatus::Pending;
            }
            self.save()?;
            return Ok(Recovery::Restarted);
        }

        let interrupted: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, s)| *s == SimStatus::InProgress)
            .map(|(p, _)| p.clone())
            .collect();

        if !interrupted.is_empty() && archive.is_file() {
            let mut writer = ArchiveWriter::open(archive)?;
            for sim in &interrupted {
                if writer.delete_group(&group_name(sim))? {
                    log::info!("Deleting {} from {}", group_name(sim), archive.display());
                }
            }
            writer.finish()?;
        }
        for entry in &mut self.entries {
            if entry.1 == SimStatus::InProgress {
                entry.1 = SimStatus::Pending;
            }
        }
        self.save()?;
        log::info!("Continuing from checkpoint {}", self.path.display());
        Ok(Recovery::Resumed {
            reset: interrupted.len(),
        })
    }
}

/// Archive group name of a simulation folder: its directory name.
pub fn group_name(sim: &Path) -> String {
    sim.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| sim.display().to_string())
}
