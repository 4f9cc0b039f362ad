//! Output options for delimited text exports.

use std::path::PathBuf;

/// Options for [`write_output`](super::write_output).
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Destination file; a `.bpf` extension writes a filtered file
    pub path: PathBuf,

    /// Cell delimiter
    pub delimiter: String,

    /// Write a `key[units]` header line
    pub header: bool,

    /// VR Ulysses format: comma delimited with header, named `User.csv`
    pub ulysses: bool,
}

impl OutputOptions {
    /// Create new output options for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Enable or disable the header line.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Write in VR Ulysses format.
    pub fn ulysses(mut self) -> Self {
        self.ulysses = true;
        self
    }

    /// Delimiter, header flag and path after applying Ulysses rules.
    pub(crate) fn resolved(&self) -> (String, bool, PathBuf) {
        if self.ulysses {
            (",".to_string(), true, self.path.with_file_name(ULYSSES_FILE))
        } else {
            (self.delimiter.clone(), self.header, self.path.clone())
        }
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bigplanet.out"),
            delimiter: " ".to_string(),
            header: false,
            ulysses: false,
        }
    }
}

/// File name of VR Ulysses exports.
pub const ULYSSES_FILE: &str = "User.csv";
