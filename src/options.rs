//! Run options and configuration.

use crate::input::VplanetHelp;

/// Options for building archives and filtered files.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// What to build
    pub mode: RunMode,

    /// Number of worker threads for archive creation
    pub cores: usize,

    /// Replace existing output files
    pub overwrite: bool,

    /// How checksum mismatches are handled
    pub error_mode: ErrorMode,

    /// Option metadata; `None` runs `vplanet -H` on demand
    pub help: Option<VplanetHelp>,
}

impl RunOptions {
    /// Create new run options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set run mode.
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build an archive.
    pub fn archive(mut self) -> Self {
        self.mode = RunMode::Archive;
        self
    }

    /// Set the number of worker threads (at least one is used).
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores.max(1);
        self
    }

    /// Enable or disable overwriting existing outputs.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Warn about checksum mismatches instead of failing.
    pub fn ignore_corrupt(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Use the given option metadata instead of running `vplanet -H`.
    pub fn with_help(mut self, help: VplanetHelp) -> Self {
        self.help = Some(help);
        self
    }

    /// Whether checksum mismatches are tolerated.
    pub fn is_lenient(&self) -> bool {
        self.error_mode == ErrorMode::Lenient
    }

    /// Option metadata, loading it from VPLanet if none was given.
    pub fn resolve_help(&self) -> VplanetHelp {
        match &self.help {
            Some(help) => help.clone(),
            None => VplanetHelp::from_vplanet(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Filter,
            cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            overwrite: false,
            error_mode: ErrorMode::Strict,
            help: None,
        }
    }
}

/// Checksum error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any checksum mismatch
    #[default]
    Strict,
    /// Log a warning and continue
    Lenient,
}

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Filtered file (or Ulysses CSV)
    #[default]
    Filter,
    /// Archive with one group per simulation
    Archive,
}
