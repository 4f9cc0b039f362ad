//! The BigPlanet input file (`bpl.in`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::export::ULYSSES_FILE;

use super::lines::option_lines;

/// Parsed BigPlanet input file.
///
/// Relative paths are resolved against the directory holding the input
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BplInput {
    /// Path of the input file itself
    pub source: PathBuf,
    /// Folder containing one sub-directory per simulation
    pub dest_folder: String,
    /// Archive file name (`<folder>.bpa` by default)
    pub archive_file: String,
    /// Filtered output file name (`<folder>.bpf` by default)
    pub output_file: String,
    /// Body input files inside each simulation folder
    pub body_files: Vec<String>,
    /// Primary input file (usually `vpl.in`)
    pub primary_file: Option<String>,
    /// Write the VR Ulysses CSV instead of a filtered file
    pub ulysses: bool,
    /// Restrict to simulation folders whose name contains this
    pub sim_name: Option<String>,
    /// Keys to keep
    pub include: Vec<String>,
    /// Keys to drop
    pub exclude: Vec<String>,
}

impl BplInput {
    /// Read and parse an input file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse input file content; `source` is used to resolve paths.
    pub fn parse(content: &str, source: &Path) -> Result<Self> {
        let mut dest_folder: Option<String> = None;
        let mut archive_file = None;
        let mut output_file = None;
        let mut body_files = Vec::new();
        let mut primary_file = None;
        let mut ulysses = false;
        let mut sim_name = None;
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for line in option_lines(content) {
            let value = line.first_value().map(String::from);
            match line.name() {
                "sDestFolder" | "destfolder" => dest_folder = value,
                "sArchiveFile" | "sBigplanetFile" => archive_file = value,
                "sOutputName" | "sOutputFile" => output_file = value,
                "sPrimaryFile" => primary_file = value,
                "sSimName" => sim_name = value,
                "bUlysses" => {
                    ulysses = matches!(value.as_deref(), Some("1") | Some("true") | Some("True"))
                }
                "saBodyFiles" => body_files = strip_brackets(line.values()),
                "saKeyInclude" => include = strip_brackets(line.values()),
                "saKeyExclude" => exclude = strip_brackets(line.values()),
                other => log::debug!("Ignoring option {} in {}", other, source.display()),
            }
        }

        if !include.is_empty() && !exclude.is_empty() {
            return Err(Error::InvalidInput(
                "saKeyInclude and saKeyExclude are mutually exclusive".to_string(),
            ));
        }

        let dest_folder = dest_folder
            .map(|f| f.trim_end_matches('/').to_string())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| Error::MissingOption("sDestFolder".to_string()))?;

        let stem = folder_stem(&dest_folder);
        let input = Self {
            source: source.to_path_buf(),
            archive_file: archive_file.unwrap_or_else(|| format!("{}.bpa", stem)),
            output_file: output_file.unwrap_or_else(|| format!("{}.bpf", stem)),
            dest_folder,
            body_files,
            primary_file,
            ulysses,
            sim_name,
            include,
            exclude,
        };

        log::debug!("Folder name: {}", input.dest_folder);
        log::debug!("Archive file: {}", input.archive_file);
        log::debug!("Output file: {}", input.output_file);
        log::debug!("Body files: {:?}", input.body_files);
        log::debug!("Primary file: {:?}", input.primary_file);

        Ok(input)
    }

    /// Directory the input file lives in.
    pub fn base_dir(&self) -> PathBuf {
        match self.source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir().join(p)
        }
    }

    /// Resolved simulation folder.
    pub fn folder_path(&self) -> PathBuf {
        self.resolve(&self.dest_folder)
    }

    /// Resolved archive path.
    pub fn archive_path(&self) -> PathBuf {
        self.resolve(&self.archive_file)
    }

    /// Resolved filtered output path (`User.csv` in Ulysses mode).
    pub fn output_path(&self) -> PathBuf {
        if self.ulysses {
            self.resolve(ULYSSES_FILE)
        } else {
            self.resolve(&self.output_file)
        }
    }

    /// Checkpoint file tracking archive progress: `.<folder>_BPL`.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.base_dir()
            .join(format!(".{}_BPL", folder_stem(&self.dest_folder)))
    }

    /// Marker file left by the simulation runner: `.<folder>`.
    pub fn marker_path(&self) -> PathBuf {
        self.base_dir()
            .join(format!(".{}", folder_stem(&self.dest_folder)))
    }

    /// Body files followed by the primary file.
    pub fn infiles(&self) -> Result<Vec<String>> {
        let primary = self
            .primary_file
            .clone()
            .ok_or_else(|| Error::MissingOption("sPrimaryFile".to_string()))?;
        let mut files = self.body_files.clone();
        files.push(primary);
        Ok(files)
    }

    /// Whether a key selection was given.
    pub fn has_key_list(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }
}

fn strip_brackets(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim_matches(|c| c == '[' || c == ']' || c == ',').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Last path component of a folder option.
fn folder_stem(folder: &str) -> &str {
    folder.rsplit('/').next().unwrap_or(folder)
}
