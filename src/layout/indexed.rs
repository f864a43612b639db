//! Indexed layout
//!
//! A fixed header and a coordinate slot table sit at the front of the file;
//! records are appended to the data region behind them. Slots are
//! independent, so a Put never disturbs another coordinate and a Delete
//! clears exactly one entry.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                        │
//! │   Magic: "CUBE" (4) | Version: u16 (2) | Dimension: u32  │
//! │   (4) | Reserved (6)                                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ Slot Table (N³ × 16 bytes, scan order)                   │
//! │   Offset: u64 (8) | Length: u32 (4) | Reserved (4)       │
//! │   (Length = 0 means the slot is empty)                   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Data Region (variable)                                   │
//! │   records appended back-to-back                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::coord::Coord;
use crate::document::Document;
use crate::error::{CubeError, Result};
use crate::record::{self, RecordRead};

/// Magic bytes identifying an indexed cube file
pub(crate) const MAGIC: &[u8; 4] = b"CUBE";

/// Current file format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Dimension (4) + Reserved (6)
pub const HEADER_SIZE: u64 = 16;

/// Slot entry size: Offset (8) + Length (4) + Reserved (4)
pub const SLOT_ENTRY_SIZE: u64 = 16;

/// One slot table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotEntry {
    /// Absolute file offset of the record
    pub offset: u64,
    /// Total record length (header included); zero when empty
    pub len: u32,
}

impl SlotEntry {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn to_bytes(self) -> [u8; SLOT_ENTRY_SIZE as usize] {
        let mut buf = [0u8; SLOT_ENTRY_SIZE as usize];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.len.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8; SLOT_ENTRY_SIZE as usize]) -> Self {
        Self {
            offset: u64::from_le_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ]),
            len: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        }
    }
}

/// Slot-table placement
#[derive(Debug, Clone, Copy)]
pub struct IndexedLayout {
    dimension: u32,
}

impl IndexedLayout {
    /// Initialize an empty file, or validate the header of an existing one
    pub fn open(file: &mut File, dimension: u32) -> Result<Self> {
        let layout = Self { dimension };
        let file_len = file.metadata()?.len();

        if file_len == 0 {
            layout.write_header(file)?;
            file.set_len(layout.data_start())?;
            tracing::debug!(
                "Initialized slot table for dimension {} ({} bytes)",
                dimension,
                layout.data_start()
            );
            return Ok(layout);
        }

        if file_len < HEADER_SIZE {
            return Err(CubeError::Config(format!(
                "File too short for header: {} bytes",
                file_len
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(CubeError::Config("Bad magic: not an indexed cube file".into()));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(CubeError::Config(format!(
                "Unsupported format version {} (expected {})",
                version, VERSION
            )));
        }

        let stored = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
        if stored != dimension {
            return Err(CubeError::Config(format!(
                "Dimension mismatch: file was written with {}, opened with {}",
                stored, dimension
            )));
        }

        if file_len < layout.data_start() {
            return Err(CubeError::Config(format!(
                "Slot table truncated: file is {} bytes, table ends at {}",
                file_len,
                layout.data_start()
            )));
        }

        Ok(layout)
    }

    /// Position of the slot table entry for `coord`
    pub fn offset_of(&self, coord: Coord) -> u64 {
        HEADER_SIZE + coord.linear(self.dimension) * SLOT_ENTRY_SIZE
    }

    /// First byte of the data region
    pub fn data_start(&self) -> u64 {
        let n = u64::from(self.dimension);
        HEADER_SIZE + n * n * n * SLOT_ENTRY_SIZE
    }

    pub fn read_entry(&self, file: &mut File, coord: Coord) -> Result<SlotEntry> {
        let mut buf = [0u8; SLOT_ENTRY_SIZE as usize];
        file.seek(SeekFrom::Start(self.offset_of(coord)))?;
        file.read_exact(&mut buf)?;
        Ok(SlotEntry::from_bytes(&buf))
    }

    fn write_entry(&self, file: &mut File, coord: Coord, entry: SlotEntry) -> Result<()> {
        file.seek(SeekFrom::Start(self.offset_of(coord)))?;
        file.write_all(&entry.to_bytes())?;
        Ok(())
    }

    fn write_header<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&self.dimension.to_le_bytes())?;
        writer.write_all(&[0u8; 6])?;
        Ok(())
    }

    /// Append the record and point the slot at it
    pub fn put(&self, file: &mut File, coord: Coord, document: &Document) -> Result<()> {
        let bytes = record::encode(document)?;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(&bytes)?;

        let entry = SlotEntry {
            offset,
            len: bytes.len() as u32,
        };
        self.write_entry(file, coord, entry)?;

        tracing::debug!("Put {} at offset {} ({} bytes)", coord, offset, bytes.len());
        Ok(())
    }

    pub fn get(&self, file: &mut File, coord: Coord) -> Result<Document> {
        let entry = self.read_entry(file, coord)?;
        if entry.is_empty() {
            return Err(CubeError::NotFound { coord });
        }

        file.seek(SeekFrom::Start(entry.offset))?;
        match record::read_record(file)? {
            RecordRead::Record(document, len) if len == u64::from(entry.len) => Ok(document),
            RecordRead::Record(_, len) => Err(CubeError::Decode(format!(
                "Slot {} expects {} bytes, record at offset {} is {}",
                coord, entry.len, entry.offset, len
            ))),
            RecordRead::Hole | RecordRead::Eof => Err(CubeError::Decode(format!(
                "Slot {} points at offset {} with no record",
                coord, entry.offset
            ))),
        }
    }

    /// Clear the slot; the record stays in the data region until compaction
    pub fn delete(&self, file: &mut File, coord: Coord) -> Result<usize> {
        let entry = self.read_entry(file, coord)?;
        if entry.is_empty() {
            return Err(CubeError::NotFound { coord });
        }

        self.write_entry(file, coord, SlotEntry::default())?;

        tracing::debug!(
            "Deleted {}, {} bytes at offset {} left for compaction",
            coord,
            entry.len,
            entry.offset
        );
        Ok(0)
    }

    /// Rewrite the file so the data region holds only live records
    ///
    /// Builds a sibling file and renames it over `path`. The returned handle
    /// is the one the sibling was written through, so it stays valid across
    /// the rename. On failure the sibling is removed and `file` is untouched.
    pub fn compact(&self, file: &mut File, path: &Path) -> Result<File> {
        let temp_path = compaction_path(path);

        let result = self
            .write_compacted(file, &temp_path)
            .and_then(|(out, live, data_len)| {
                fs::rename(&temp_path, path)?;
                Ok((out, live, data_len))
            });

        match result {
            Ok((out, live, data_len)) => {
                tracing::info!(
                    "Compacted {}: {} live record(s), data region {} bytes",
                    path.display(),
                    live,
                    data_len
                );
                Ok(out)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            "Failed to remove {}: {}",
                            temp_path.display(),
                            cleanup
                        );
                    }
                }
                tracing::warn!("Compaction of {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Copy live records into a fresh file at `temp_path`
    ///
    /// Returns the synced handle, the live record count and the data length.
    fn write_compacted(&self, file: &mut File, temp_path: &Path) -> Result<(File, usize, u64)> {
        let out = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(temp_path)?;

        let mut writer = BufWriter::new(out);
        self.write_header(&mut writer)?;
        writer.write_all(&vec![0u8; (self.data_start() - HEADER_SIZE) as usize])?;

        let mut table = Vec::new();
        let mut next = self.data_start();
        for coord in Coord::iter_cube(self.dimension) {
            let entry = self.read_entry(file, coord)?;
            if entry.is_empty() {
                continue;
            }

            let mut raw = vec![0u8; entry.len as usize];
            file.seek(SeekFrom::Start(entry.offset))?;
            file.read_exact(&mut raw)?;
            writer.write_all(&raw)?;

            table.push((
                coord,
                SlotEntry {
                    offset: next,
                    len: entry.len,
                },
            ));
            next += u64::from(entry.len);
        }

        for (coord, entry) in &table {
            writer.seek(SeekFrom::Start(self.offset_of(*coord)))?;
            writer.write_all(&entry.to_bytes())?;
        }

        let out = writer
            .into_inner()
            .map_err(|e| CubeError::Io(e.into_error()))?;
        out.sync_all()?;

        Ok((out, table.len(), next - self.data_start()))
    }
}

/// `<path>.compact`, next to the store file
fn compaction_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".compact");
    PathBuf::from(name)
}
