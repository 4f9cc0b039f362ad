//! BigPlanet archive and filtered files.
//!
//! Both file kinds share one container: a header followed by append-only
//! group records (see [`format`]). An archive holds one group per
//! simulation; a filtered file holds a single root group `/`.

pub mod checksum;
mod detect;
pub mod format;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{Dataset, SimData};
use crate::options::ErrorMode;

pub use checksum::{fletcher32, md5_checksum, md5_path, write_md5, Md5Status};
pub use detect::{detect_kind_from_bytes, detect_kind_from_path, is_bpl, FileKind, FORMAT_VERSION, MAGIC};
use format::{decode_records, Header, Record};

/// Name of the single group of a filtered file.
pub const ROOT_GROUP: &str = "/";

/// A BigPlanet file opened for reading.
#[derive(Debug, Clone)]
pub struct BplFile {
    path: PathBuf,
    header: Header,
    groups: BTreeMap<String, SimData>,
}

impl BplFile {
    /// Open a file, failing on any checksum mismatch.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_mode(path, ErrorMode::Strict)
    }

    /// Open a file with the given checksum handling.
    ///
    /// Every record is verified against its Fletcher-32 checksum and the
    /// MD5 sidecar is compared when present. In lenient mode corrupt
    /// records are skipped with a warning.
    pub fn open_with_mode<P: AsRef<Path>>(path: P, mode: ErrorMode) -> Result<Self> {
        let path = path.as_ref();
        let lenient = mode == ErrorMode::Lenient;

        if md5_path(path).is_file() {
            md5_checksum(path, lenient)?;
        }

        let bytes = fs::read(path)?;
        let (header, offset) = Header::decode(&bytes)?;

        let mut live: BTreeMap<String, Record> = BTreeMap::new();
        for record in decode_records(&bytes, offset) {
            let record = match record {
                Ok(r) => r,
                Err(e) if lenient => {
                    log::warn!("{}: {}", path.display(), e);
                    break;
                }
                Err(e) => return Err(e),
            };

            if !record.verify() {
                let message = format!(
                    "Fletcher-32 checksum mismatch in group {} of {}",
                    record.name,
                    path.display()
                );
                if lenient {
                    log::warn!("{}", message);
                    continue;
                }
                return Err(Error::Corrupted(message));
            }

            if record.is_tombstone() {
                live.remove(&record.name);
            } else {
                live.insert(record.name.clone(), record);
            }
        }

        let mut groups = BTreeMap::new();
        for (name, record) in live {
            groups.insert(name, record.decode_data()?);
        }
        log::debug!("Opened {} with {} groups", path.display(), groups.len());

        Ok(Self {
            path: path.to_path_buf(),
            header,
            groups,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File kind.
    pub fn kind(&self) -> FileKind {
        self.header.kind
    }

    /// Whether this is an archive.
    pub fn is_archive(&self) -> bool {
        self.header.kind == FileKind::Archive
    }

    /// Creation time.
    pub fn created(&self) -> DateTime<Utc> {
        self.header.created
    }

    /// Group names, sorted.
    pub fn groups(&self) -> Vec<&str> {
        self.groups.keys().map(|k| k.as_str()).collect()
    }

    /// Datasets of a group.
    pub fn group(&self, name: &str) -> Option<&SimData> {
        self.groups.get(name)
    }

    /// First group in name order.
    pub fn first_group(&self) -> Option<&SimData> {
        self.groups.values().next()
    }

    /// Iterate groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SimData)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// One dataset of one group.
    pub fn dataset(&self, group: &str, key: &str) -> Option<&Dataset> {
        self.groups.get(group).and_then(|g| g.get(key))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the file has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Appends groups to a BigPlanet file.
pub struct ArchiveWriter {
    path: PathBuf,
    kind: FileKind,
    file: BufWriter<File>,
    groups: BTreeSet<String>,
}

impl ArchiveWriter {
    /// Create a new file, replacing any existing one.
    pub fn create<P: AsRef<Path>>(path: P, kind: FileKind) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = BufWriter::new(File::create(&path)?);
        file.write_all(&Header::new(kind).encode())?;
        file.flush()?;

        Ok(Self {
            path,
            kind,
            file,
            groups: BTreeSet::new(),
        })
    }

    /// Open an existing file for appending.
    ///
    /// The set of live groups is rebuilt from the records; a truncated
    /// trailing record is cut off.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let (header, offset) = Header::decode(&bytes)?;

        let mut groups = BTreeSet::new();
        let mut valid_len = offset;
        for record in decode_records(&bytes, offset) {
            let Ok(record) = record else {
                log::warn!("{}: dropping truncated record", path.display());
                break;
            };
            valid_len += record.encode().len();
            if record.is_tombstone() {
                groups.remove(&record.name);
            } else {
                groups.insert(record.name);
            }
        }

        let file = OpenOptions::new().write(true).open(&path)?;
        file.set_len(valid_len as u64)?;
        let file = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            kind: header.kind,
            file: BufWriter::new(file),
            groups,
        })
    }

    /// Open an existing file or create a new one.
    pub fn open_or_create<P: AsRef<Path>>(path: P, kind: FileKind) -> Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            let writer = Self::open(path)?;
            if writer.kind != kind {
                return Err(Error::InvalidInput(format!(
                    "{} is a {} file",
                    path.display(),
                    writer.kind
                )));
            }
            Ok(writer)
        } else {
            Self::create(path, kind)
        }
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a live group exists.
    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no live groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append a group, replacing any earlier group of the same name.
    pub fn write_group(&mut self, name: &str, data: &SimData) -> Result<()> {
        let record = Record::group(name, data)?;
        record.write_to(&mut self.file)?;
        self.file.flush()?;
        self.groups.insert(name.to_string());
        log::debug!("Wrote group {} ({} datasets)", name, data.len());
        Ok(())
    }

    /// Delete a group. Returns whether it existed.
    pub fn delete_group(&mut self, name: &str) -> Result<bool> {
        if !self.groups.remove(name) {
            return Ok(false);
        }
        Record::tombstone(name).write_to(&mut self.file)?;
        self.file.flush()?;
        log::debug!("Deleted group {}", name);
        Ok(true)
    }

    /// Flush to disk and write the MD5 sidecar.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        write_md5(&self.path)?;
        Ok(self.path)
    }
}

/// Write `data` as a filtered file with a single root group.
pub fn write_filtered<P: AsRef<Path>>(path: P, data: &SimData) -> Result<PathBuf> {
    let mut writer = ArchiveWriter::create(path, FileKind::Filtered)?;
    writer.write_group(ROOT_GROUP, data)?;
    writer.finish()
}

/// Rewrite a file keeping only the latest record of each live group.
///
/// Returns the number of bytes reclaimed.
pub fn compact<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let (header, offset) = Header::decode(&bytes)?;

    let mut live: BTreeMap<String, Record> = BTreeMap::new();
    for record in decode_records(&bytes, offset) {
        let record = record?;
        if record.is_tombstone() {
            live.remove(&record.name);
        } else {
            live.insert(record.name.clone(), record);
        }
    }

    let mut out = header.encode();
    for record in live.values() {
        out.extend(record.encode());
    }

    let tmp = path.with_extension("compact");
    fs::write(&tmp, &out)?;
    fs::rename(&tmp, path)?;
    write_md5(path)?;

    let reclaimed = (bytes.len() - out.len().min(bytes.len())) as u64;
    log::info!("Compacted {}: {} bytes reclaimed", path.display(), reclaimed);
    Ok(reclaimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use tempfile::TempDir;

    fn sim(mass: f64) -> SimData {
        let mut data = SimData::new();
        data.insert_value("earth:Mass:final", "kg", Value::Number(mass));
        data
    }

    #[test]
    fn test_write_and_read_groups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");

        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_01", &sim(2.0)).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.finish().unwrap();

        let file = BplFile::open(&path).unwrap();
        assert!(file.is_archive());
        assert_eq!(file.groups(), vec!["sim_00", "sim_01"]);
        assert_eq!(
            file.dataset("sim_01", "earth:Mass:final").unwrap().values,
            vec![Value::Number(2.0)]
        );
        assert!(dir.path().join("test.bpa.md5").is_file());
    }

    #[test]
    fn test_later_record_replaces_and_tombstone_deletes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");

        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.write_group("sim_01", &sim(2.0)).unwrap();
        writer.write_group("sim_00", &sim(3.0)).unwrap();
        assert!(writer.delete_group("sim_01").unwrap());
        assert!(!writer.delete_group("sim_09").unwrap());
        writer.finish().unwrap();

        let file = BplFile::open(&path).unwrap();
        assert_eq!(file.groups(), vec!["sim_00"]);
        assert_eq!(
            file.dataset("sim_00", "earth:Mass:final").unwrap().values,
            vec![Value::Number(3.0)]
        );
    }

    #[test]
    fn test_reopen_for_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");

        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.finish().unwrap();

        let mut writer = ArchiveWriter::open_or_create(&path, FileKind::Archive).unwrap();
        assert!(writer.contains_group("sim_00"));
        writer.write_group("sim_01", &sim(2.0)).unwrap();
        writer.finish().unwrap();

        assert_eq!(BplFile::open(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_reopen_cuts_torn_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");

        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        drop(writer);

        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[7, 0, 0, 0, b's']);
        fs::write(&path, &bytes).unwrap();

        let mut writer = ArchiveWriter::open(&path).unwrap();
        assert!(writer.contains_group("sim_00"));
        writer.write_group("sim_01", &sim(2.0)).unwrap();
        writer.finish().unwrap();

        let file = BplFile::open(&path).unwrap();
        assert_eq!(file.groups(), vec!["sim_00", "sim_01"]);
        assert_eq!(
            file.dataset("sim_01", "earth:Mass:final").unwrap().values,
            vec![Value::Number(2.0)]
        );
    }

    #[test]
    fn test_filtered_file_keeps_archive_sidecar() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("sweep.bpa");
        let mut writer = ArchiveWriter::create(&archive, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.finish().unwrap();

        write_filtered(dir.path().join("sweep.bpf"), &sim(1.0)).unwrap();

        assert!(dir.path().join("sweep.bpa.md5").is_file());
        assert!(dir.path().join("sweep.bpf.md5").is_file());
        assert!(BplFile::open(&archive).is_ok());
    }

    #[test]
    fn test_kind_mismatch_on_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpf");
        write_filtered(&path, &sim(1.0)).unwrap();

        let result = ArchiveWriter::open_or_create(&path, FileKind::Archive);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_filtered_root_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpf");
        write_filtered(&path, &sim(1.0)).unwrap();

        let file = BplFile::open(&path).unwrap();
        assert_eq!(file.kind(), FileKind::Filtered);
        assert_eq!(file.groups(), vec![ROOT_GROUP]);
    }

    #[test]
    fn test_corrupt_record_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");
        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.write_group("sim_01", &sim(2.0)).unwrap();
        drop(writer);

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(BplFile::open(&path), Err(Error::Corrupted(_))));
        let file = BplFile::open_with_mode(&path, ErrorMode::Lenient).unwrap();
        assert_eq!(file.groups(), vec!["sim_00"]);
    }

    #[test]
    fn test_md5_mismatch_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");
        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.finish().unwrap();
        fs::write(md5_path(&path), "0000\n").unwrap();

        assert!(matches!(BplFile::open(&path), Err(Error::Corrupted(_))));
        assert!(BplFile::open_with_mode(&path, ErrorMode::Lenient).is_ok());
    }

    #[test]
    fn test_compact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bpa");
        let mut writer = ArchiveWriter::create(&path, FileKind::Archive).unwrap();
        writer.write_group("sim_00", &sim(1.0)).unwrap();
        writer.write_group("sim_00", &sim(2.0)).unwrap();
        writer.write_group("sim_01", &sim(3.0)).unwrap();
        writer.delete_group("sim_01").unwrap();
        writer.finish().unwrap();

        let reclaimed = compact(&path).unwrap();
        assert!(reclaimed > 0);
        let file = BplFile::open(&path).unwrap();
        assert_eq!(file.groups(), vec!["sim_00"]);
        assert_eq!(
            file.dataset("sim_00", "earth:Mass:final").unwrap().values,
            vec![Value::Number(2.0)]
        );
    }

    #[test]
    fn test_open_foreign_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.h5");
        fs::write(&path, b"\x89HDF\r\n\x1a\n").unwrap();
        assert!(matches!(BplFile::open(&path), Err(Error::UnknownFormat)));
    }
}
