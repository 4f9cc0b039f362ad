//! On-disk layout of BigPlanet files.
//!
//! Header:
//! - magic `BPLF`, format version (u8), file kind (u8)
//! - u32 length + RFC 3339 creation timestamp
//!
//! Followed by records:
//! - u32 group name length + UTF-8 group name
//! - u32 payload length
//! - u32 Fletcher-32 of the payload
//! - payload: gzip of the JSON encoded group datasets
//!
//! All integers are little endian. An empty payload deletes the group.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::model::SimData;

use super::checksum::fletcher32;
use super::detect::{detect_kind_from_bytes, FileKind, FORMAT_VERSION, MAGIC};

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// File kind
    pub kind: FileKind,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl Header {
    /// Header for a new file created now.
    pub fn new(kind: FileKind) -> Self {
        Self {
            kind,
            created: Utc::now(),
        }
    }

    /// Encode the header.
    pub fn encode(&self) -> Vec<u8> {
        let timestamp = self.created.to_rfc3339();
        let mut out = Vec::with_capacity(MAGIC.len() + 6 + timestamp.len());
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.push(self.kind.to_byte());
        out.extend_from_slice(&(timestamp.len() as u32).to_le_bytes());
        out.extend_from_slice(timestamp.as_bytes());
        out
    }

    /// Decode a header, returning it with the offset of the first record.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let kind = detect_kind_from_bytes(data)?;
        let mut cursor = Cursor::new(data, MAGIC.len() + 2);
        let len = cursor.u32().ok_or(Error::UnknownFormat)? as usize;
        let raw = cursor.bytes(len).ok_or(Error::UnknownFormat)?;
        let text = std::str::from_utf8(raw).map_err(|_| Error::UnknownFormat)?;
        let created = DateTime::parse_from_rfc3339(text)
            .map_err(|e| Error::Corrupted(format!("invalid header timestamp: {}", e)))?
            .with_timezone(&Utc);
        Ok((Self { kind, created }, cursor.pos))
    }
}

/// One record as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Group name
    pub name: String,
    /// Stored Fletcher-32 checksum
    pub checksum: u32,
    /// Compressed payload; empty for a deletion
    pub payload: Vec<u8>,
}

impl Record {
    /// Record holding a group's datasets.
    pub fn group(name: &str, data: &SimData) -> Result<Self> {
        let payload = encode_payload(data)?;
        Ok(Self {
            name: name.to_string(),
            checksum: fletcher32(&payload),
            payload,
        })
    }

    /// Record deleting a group.
    pub fn tombstone(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checksum: fletcher32(&[]),
            payload: Vec::new(),
        }
    }

    /// Whether this record deletes its group.
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the payload matches its stored checksum.
    pub fn verify(&self) -> bool {
        fletcher32(&self.payload) == self.checksum
    }

    /// Encode the record.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.name.len() + self.payload.len());
        out.extend_from_slice(&(self.name.len() as u32).to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Write the encoded record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    /// Decode the datasets of this record.
    pub fn decode_data(&self) -> Result<SimData> {
        decode_payload(&self.payload)
    }
}

/// Decode all records after the header.
///
/// A truncated record is reported as `Error::Corrupted`.
pub fn decode_records(data: &[u8], offset: usize) -> Vec<Result<Record>> {
    let mut cursor = Cursor::new(data, offset);
    let mut records = Vec::new();

    while cursor.pos < data.len() {
        let start = cursor.pos;
        match cursor.record() {
            Some(record) => records.push(Ok(record)),
            None => {
                records.push(Err(Error::Corrupted(format!(
                    "truncated record at byte {}",
                    start
                ))));
                break;
            }
        }
    }
    records
}

/// gzip(JSON(datasets)).
pub fn encode_payload(data: &SimData) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(data)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`encode_payload`].
pub fn decode_payload(payload: &[u8]) -> Result<SimData> {
    let mut json = Vec::new();
    GzDecoder::new(payload).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        let raw = self.bytes(4)?;
        Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn record(&mut self) -> Option<Record> {
        let name_len = self.u32()? as usize;
        let name = String::from_utf8_lossy(self.bytes(name_len)?).to_string();
        let payload_len = self.u32()? as usize;
        let checksum = self.u32()?;
        let payload = self.bytes(payload_len)?.to_vec();
        Some(Record {
            name,
            checksum,
            payload,
        })
    }
}
