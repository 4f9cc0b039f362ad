//! BigPlanet file detection and validation.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// BigPlanet magic bytes.
pub const MAGIC: &[u8] = b"BPLF";
const MAGIC_LEN: usize = 4;

/// Format version written by this library.
pub const FORMAT_VERSION: u8 = 1;

/// What a BigPlanet file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// One group per simulation (`.bpa`)
    Archive,
    /// Selected keys aggregated under the root group (`.bpf`)
    Filtered,
}

impl FileKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            FileKind::Archive => b'A',
            FileKind::Filtered => b'F',
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            b'A' => Ok(FileKind::Archive),
            b'F' => Ok(FileKind::Filtered),
            _ => Err(Error::UnknownFormat),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Archive => f.write_str("archive"),
            FileKind::Filtered => f.write_str("filtered"),
        }
    }
}

/// Detect the file kind from a path.
///
/// # Example
/// ```no_run
/// use bigplanet::store::detect_kind_from_path;
///
/// let kind = detect_kind_from_path("sweep.bpa").unwrap();
/// println!("{} file", kind);
/// ```
pub fn detect_kind_from_path<P: AsRef<Path>>(path: P) -> Result<FileKind> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; MAGIC_LEN + 2];
    reader
        .read_exact(&mut header)
        .map_err(|_| Error::UnknownFormat)?;
    detect_kind_from_bytes(&header)
}

/// Detect the file kind from the first bytes of a file.
pub fn detect_kind_from_bytes(data: &[u8]) -> Result<FileKind> {
    if data.len() < MAGIC_LEN + 2 || !data.starts_with(MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version = data[MAGIC_LEN];
    if version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    FileKind::from_byte(data[MAGIC_LEN + 1])
}

/// Check if a file is a BigPlanet file.
pub fn is_bpl<P: AsRef<Path>>(path: P) -> bool {
    detect_kind_from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_archive() {
        let data = b"BPLF\x01A rest";
        assert_eq!(detect_kind_from_bytes(data).unwrap(), FileKind::Archive);
    }

    #[test]
    fn test_detect_filtered() {
        assert_eq!(detect_kind_from_bytes(b"BPLF\x01F").unwrap(), FileKind::Filtered);
    }

    #[test]
    fn test_detect_foreign_data() {
        assert!(matches!(detect_kind_from_bytes(b"\x89HDF\r\n"), Err(Error::UnknownFormat)));
        assert!(matches!(detect_kind_from_bytes(b"BPL"), Err(Error::UnknownFormat)));
        assert!(matches!(detect_kind_from_bytes(b"BPLF\x01X"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_future_version() {
        assert!(matches!(
            detect_kind_from_bytes(b"BPLF\x09A"),
            Err(Error::UnsupportedVersion(9))
        ));
    }
}
