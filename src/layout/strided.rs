//! Strided layout
//!
//! Each coordinate owns a nominal window of `slot_stride` bytes starting at
//! `linear(coord) * slot_stride`. Records are variable length, so a window
//! is only a reservation: an oversized record spills into its neighbours.
//!
//! Writes are destructive. A Put truncates the file at the slot offset
//! before writing, dropping every later slot. A Delete rewrites the tail,
//! packing every later record back into the deleted slot's place.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};

use crate::coord::Coord;
use crate::document::Document;
use crate::error::{CubeError, Result};
use crate::record::{self, RecordRead, MIN_RECORD_SIZE};

/// Offset-by-formula placement
#[derive(Debug, Clone, Copy)]
pub struct StridedLayout {
    dimension: u32,
    slot_stride: u64,
}

impl StridedLayout {
    pub fn new(dimension: u32, slot_stride: u64) -> Self {
        Self {
            dimension,
            slot_stride,
        }
    }

    /// `(z*N*N + y*N + x) * slot_stride`
    pub fn offset_of(&self, coord: Coord) -> u64 {
        coord.linear(self.dimension) * self.slot_stride
    }

    pub fn slot_stride(&self) -> u64 {
        self.slot_stride
    }

    /// Truncate at the slot offset, then write the record there
    pub fn put(&self, file: &mut File, coord: Coord, document: &Document) -> Result<()> {
        let offset = self.offset_of(coord);
        let bytes = record::encode(document)?;

        if bytes.len() as u64 > self.slot_stride {
            tracing::warn!(
                "Record for {} is {} bytes, exceeding slot stride {}; neighbouring slots will be overwritten",
                coord,
                bytes.len(),
                self.slot_stride
            );
        }

        file.set_len(offset)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&bytes)?;

        tracing::debug!(
            "Put {} at offset {} ({} bytes), file length now {}",
            coord,
            offset,
            bytes.len(),
            offset + bytes.len() as u64
        );

        Ok(())
    }

    /// Decode the record at the slot offset
    pub fn get(&self, file: &mut File, coord: Coord) -> Result<Document> {
        let offset = self.offset_of(coord);
        let file_len = file.metadata()?.len();

        if file_len < offset + MIN_RECORD_SIZE {
            return Err(CubeError::NotFound { coord });
        }

        file.seek(SeekFrom::Start(offset))?;
        match record::read_record(file)? {
            RecordRead::Record(document, _) => Ok(document),
            RecordRead::Hole | RecordRead::Eof => Err(CubeError::NotFound { coord }),
        }
    }

    /// Remove the record at `coord` and shift every following record back
    ///
    /// Returns the number of records re-appended after the cut.
    pub fn delete(&self, file: &mut File, coord: Coord) -> Result<usize> {
        let offset = self.offset_of(coord);

        // Presence check, identical to Get. A malformed record still counts as
        // present: the tail is cut at its offset and nothing is carried over.
        let skip = match self.get(file, coord) {
            Ok(_) => 1,
            Err(CubeError::Decode(reason)) => {
                tracing::warn!(
                    "Record at {} is malformed ({}); truncating at offset {}",
                    coord,
                    reason,
                    offset
                );
                0
            }
            Err(e) => return Err(e),
        };

        let remaining = self.read_tail(file, offset)?;

        file.set_len(offset)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut moved = 0;
        for document in remaining.iter().skip(skip) {
            file.write_all(&record::encode(document)?)?;
            moved += 1;
        }

        tracing::debug!(
            "Deleted {} at offset {}, shifted {} trailing record(s)",
            coord,
            offset,
            moved
        );

        Ok(moved)
    }

    /// Buffer every record from `start` to end-of-file
    ///
    /// Zero fill up to the next slot boundary (left by a Put past the old end
    /// of file) is stepped over. Decoding stops at the first record that is
    /// neither valid nor padding.
    fn read_tail(&self, file: &mut File, start: u64) -> Result<Vec<Document>> {
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut documents = Vec::new();
        let mut pos = start;

        while pos < file_len {
            reader.seek(SeekFrom::Start(pos))?;

            let failure = match record::read_record(&mut reader) {
                Ok(RecordRead::Record(document, len)) => {
                    documents.push(document);
                    pos += len;
                    continue;
                }
                Ok(RecordRead::Eof) => break,
                Ok(RecordRead::Hole) => None,
                Err(CubeError::Decode(reason)) => Some(reason),
                Err(e) => return Err(e),
            };

            match self.padding_end(&mut reader, pos, file_len)? {
                Some(next) => pos = next,
                None => {
                    if let Some(reason) = failure {
                        tracing::warn!(
                            "Stopped tail scan at offset {}: {}",
                            pos,
                            reason
                        );
                    }
                    break;
                }
            }
        }

        Ok(documents)
    }

    /// If `[pos, next slot boundary)` is all zeros and more data follows,
    /// return that boundary.
    fn padding_end<R: Read + Seek>(
        &self,
        reader: &mut R,
        pos: u64,
        file_len: u64,
    ) -> Result<Option<u64>> {
        let boundary = (pos / self.slot_stride + 1) * self.slot_stride;
        if boundary >= file_len {
            return Ok(None);
        }

        reader.seek(SeekFrom::Start(pos))?;
        let mut gap = vec![0u8; (boundary - pos) as usize];
        reader.read_exact(&mut gap)?;

        if gap.iter().all(|&b| b == 0) {
            Ok(Some(boundary))
        } else {
            Ok(None)
        }
    }
}
