//! Error types for the bigplanet library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bigplanet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or reading BigPlanet files.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required option is missing from an input file.
    #[error("Missing required option: {0}")]
    MissingOption(String),

    /// The input file is malformed or contradictory.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The simulation folder does not exist.
    #[error("Folder {} does not exist", .0.display())]
    FolderNotFound(PathBuf),

    /// A simulation output file could not be parsed.
    #[error("Parse error in {} line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The file is not a BigPlanet file.
    #[error("Unknown file format: not a BigPlanet file")]
    UnknownFormat,

    /// The BigPlanet file was written by an unsupported format version.
    #[error("Unsupported BigPlanet format version: {0}")]
    UnsupportedVersion(u8),

    /// Checksum verification failed.
    #[error("Data corruption detected: {0}")]
    Corrupted(String),

    /// The requested dataset key does not exist.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The aggregation suffix of a key is not recognised.
    #[error("Unknown aggregation option: {0}")]
    UnknownAggregation(String),

    /// The key does not follow the `body:variable[:aggregation]` syntax.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Data cannot be reshaped into the requested matrix.
    #[error("Cannot reshape {actual} values into {expected} cells")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Checkpoint file is missing or malformed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Every simulation is already in the archive.
    #[error("All groups already exist in {}", .0.display())]
    AlreadyComplete(PathBuf),

    /// The output file exists and overwrite was not requested.
    #[error("{} already exists. Use --overwrite to replace it", .0.display())]
    OutputExists(PathBuf),

    /// Error serializing or deserializing dataset payloads.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
