//! Record codec
//!
//! Serializes one document into a self-describing, length-prefixed record so
//! that sequential readers know where each record ends.
//!
//! ## Record Format
//! ```text
//! ┌────────────────┬────────────────┬────────────────────────────┐
//! │ Length (4, LE) │ CRC32 (4, LE)  │ Payload (bincode Document) │
//! └────────────────┴────────────────┴────────────────────────────┘
//! ```
//!
//! Length counts payload bytes only. The CRC covers the payload. An all-zero
//! header is the zero fill left behind when a write extends the file past
//! its end, and reads back as an empty slot.

use std::io::{self, Read};

use bytes::{BufMut, BytesMut};

use crate::document::Document;
use crate::error::{CubeError, Result};

/// Header size: Length (4) + CRC32 (4) = 8 bytes
pub const RECORD_HEADER_SIZE: u64 = 8;

/// Smallest valid record: header + encoded empty document (u64 map length)
pub const MIN_RECORD_SIZE: u64 = RECORD_HEADER_SIZE + 8;

/// Maximum payload size (16 MB)
pub const MAX_RECORD_SIZE: u32 = 16 * 1024 * 1024;

/// Outcome of reading one record from a stream
#[derive(Debug, Clone, PartialEq)]
pub enum RecordRead {
    /// A valid record and its total on-disk length (header included)
    Record(Document, u64),

    /// Zero-filled header: nothing was ever written here
    Hole,

    /// Clean end of stream before any header byte
    Eof,
}

/// Encode a document into a complete record (header + payload)
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(document).map_err(|e| CubeError::Encode(e.to_string()))?;

    if payload.len() > MAX_RECORD_SIZE as usize {
        return Err(CubeError::Encode(format!(
            "Record too large: {} bytes (max {})",
            payload.len(),
            MAX_RECORD_SIZE
        )));
    }

    let crc = crc32fast::hash(&payload);

    let mut record = BytesMut::with_capacity(RECORD_HEADER_SIZE as usize + payload.len());
    record.put_u32_le(payload.len() as u32);
    record.put_u32_le(crc);
    record.put_slice(&payload);

    Ok(record.to_vec())
}

/// Decode a single record from the front of `bytes`
///
/// Holes and empty input are reported as decode failures; use
/// [`read_record`] when those need to be told apart.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    let mut cursor = bytes;
    match read_record(&mut cursor)? {
        RecordRead::Record(document, _) => Ok(document),
        RecordRead::Hole => Err(CubeError::Decode("empty record header".into())),
        RecordRead::Eof => Err(CubeError::Decode("no record present".into())),
    }
}

/// Read the next record from a stream
pub fn read_record<R: Read>(reader: &mut R) -> Result<RecordRead> {
    let mut header = [0u8; RECORD_HEADER_SIZE as usize];
    let got = read_full(reader, &mut header)?;

    if got == 0 {
        return Ok(RecordRead::Eof);
    }
    if got < header.len() {
        return Err(CubeError::Decode(format!(
            "Incomplete header: expected {} bytes, got {}",
            header.len(),
            got
        )));
    }

    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if len == 0 && crc == 0 {
        return Ok(RecordRead::Hole);
    }

    if len > MAX_RECORD_SIZE {
        return Err(CubeError::Decode(format!(
            "Record length {} exceeds max {}",
            len, MAX_RECORD_SIZE
        )));
    }

    let mut payload = vec![0u8; len as usize];
    let got = read_full(reader, &mut payload)?;
    if got < payload.len() {
        return Err(CubeError::Decode(format!(
            "Incomplete payload: expected {} bytes, got {}",
            payload.len(),
            got
        )));
    }

    let actual = crc32fast::hash(&payload);
    if actual != crc {
        return Err(CubeError::Decode(format!(
            "CRC mismatch: stored {:#010x}, computed {:#010x}",
            crc, actual
        )));
    }

    let document: Document =
        bincode::deserialize(&payload).map_err(|e| CubeError::Decode(e.to_string()))?;

    Ok(RecordRead::Record(document, RECORD_HEADER_SIZE + u64::from(len)))
}

/// Like `read_exact`, but reports how many bytes were read on a short stream
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
