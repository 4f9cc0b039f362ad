//! Progress of a running archive build.

use std::path::{Path, PathBuf};

use crate::archive::{Checkpoint, StatusCounts};
use crate::error::{Error, Result};
use crate::input::BplInput;

/// Count completed, in-progress and remaining simulations of the archive
/// build driven by `input_path` (a `bpl.in` or `vspace.in` file).
///
/// The checkpoint is looked up beside the input file, then in the working
/// directory.
pub fn status<P: AsRef<Path>>(input_path: P) -> Result<StatusCounts> {
    let input = BplInput::load(input_path.as_ref())?;
    let checkpoint = checkpoint_location(&input).ok_or_else(|| {
        Error::Checkpoint(format!(
            "BigPlanet must be running to report progress ({} not found)",
            input.checkpoint_path().display()
        ))
    })?;

    log::debug!("Reading checkpoint {}", checkpoint.display());
    Ok(Checkpoint::load(&checkpoint)?.counts())
}

fn checkpoint_location(input: &BplInput) -> Option<PathBuf> {
    let beside = input.checkpoint_path();
    if beside.is_file() {
        return Some(beside);
    }
    let name = beside.file_name()?;
    let cwd = PathBuf::from(name);
    cwd.is_file().then_some(cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_status_counts() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("vspace.in");
        fs::write(&input, "srcfolder .\ndestfolder sweep\n").unwrap();
        let sims = vec![
            dir.path().join("sweep/a"),
            dir.path().join("sweep/b"),
            dir.path().join("sweep/c"),
        ];
        let mut checkpoint = Checkpoint::create(&dir.path().join(".sweep_BPL"), &input, &sims).unwrap();
        checkpoint.next_pending().unwrap();
        checkpoint.next_pending().unwrap();
        checkpoint.mark_complete(&sims[0]).unwrap();

        let counts = status(&input).unwrap();
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.remaining, 1);
    }

    #[test]
    fn test_status_without_checkpoint() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bpl.in");
        fs::write(&input, "sDestFolder not_running_sweep\n").unwrap();
        assert!(matches!(status(&input), Err(Error::Checkpoint(m)) if m.contains("must be running")));
    }
}
