//! Record and file integrity checks.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// Fletcher-32 checksum as computed by HDF5's filter.
///
/// Data is read as 16-bit big-endian words; an odd trailing byte is padded
/// with zero.
pub fn fletcher32(data: &[u8]) -> u32 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;

    let mut words = data.chunks_exact(2);
    loop {
        let mut block = 0;
        for word in words.by_ref().take(360) {
            sum1 += (u32::from(word[0]) << 8) | u32::from(word[1]);
            sum2 += sum1;
            block += 1;
        }
        if block == 0 {
            break;
        }
        sum1 = (sum1 & 0xffff) + (sum1 >> 16);
        sum2 = (sum2 & 0xffff) + (sum2 >> 16);
    }

    if let [last] = words.remainder() {
        sum1 += u32::from(*last) << 8;
        sum2 += sum1;
        sum1 = (sum1 & 0xffff) + (sum1 >> 16);
        sum2 = (sum2 & 0xffff) + (sum2 >> 16);
    }

    sum1 = (sum1 & 0xffff) + (sum1 >> 16);
    sum2 = (sum2 & 0xffff) + (sum2 >> 16);
    (sum2 << 16) | sum1
}

/// Outcome of an MD5 check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Md5Status {
    /// No sidecar existed; one was written
    Created,
    /// Sidecar matches the file
    Verified,
    /// Sidecar differs from the file (lenient mode only)
    Mismatch,
}

/// Sidecar path: `<file name>.md5` next to the file, so `sweep.bpa` and
/// `sweep.bpf` never share one.
pub fn md5_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".md5");
    path.with_file_name(name)
}

/// Hex MD5 digest of a file.
pub fn md5_hex(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut buf = [0u8; 32768];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write (or replace) the sidecar of a file.
pub fn write_md5(path: &Path) -> Result<String> {
    let digest = md5_hex(path)?;
    fs::write(md5_path(path), format!("{}\n", digest))?;
    Ok(digest)
}

/// Create the sidecar if absent, otherwise compare it with the file.
///
/// A mismatch is an error unless `ignore_corrupt` is set, in which case a
/// warning is logged.
pub fn md5_checksum(path: &Path, ignore_corrupt: bool) -> Result<Md5Status> {
    let sidecar = md5_path(path);
    if !sidecar.is_file() {
        write_md5(path)?;
        log::info!("Created MD5 checksum {}", sidecar.display());
        return Ok(Md5Status::Created);
    }

    let stored = fs::read_to_string(&sidecar)?;
    let stored = stored.lines().next().unwrap_or("").trim();
    let actual = md5_hex(path)?;

    if stored == actual {
        log::debug!("MD5 checksum verified for {}", path.display());
        return Ok(Md5Status::Verified);
    }

    let message = format!(
        "MD5 checksum of {} does not match {}",
        path.display(),
        sidecar.display()
    );
    if ignore_corrupt {
        log::warn!("{}", message);
        Ok(Md5Status::Mismatch)
    } else {
        Err(Error::Corrupted(message))
    }
}
