//! Layout Module
//!
//! Maps cube coordinates onto the backing file.
//!
//! ## Layouts
//! - `Strided`: slot offset computed from the coordinate, no header.
//!   Put truncates the tail, Delete shifts the tail.
//! - `Indexed`: header + slot table + append-only data region.
//!   Slots are independent; `compact` reclaims deleted records.

mod indexed;
mod strided;

use std::fs::File;
use std::path::Path;

pub use indexed::{IndexedLayout, SlotEntry, HEADER_SIZE, SLOT_ENTRY_SIZE};
pub use strided::StridedLayout;

use crate::config::{Config, Layout};
use crate::coord::Coord;
use crate::document::Document;
use crate::error::Result;

/// The active placement strategy of an open store
#[derive(Debug, Clone, Copy)]
pub enum Placement {
    Strided(StridedLayout),
    Indexed(IndexedLayout),
}

impl Placement {
    /// Prepare the placement for a freshly opened file
    pub fn open(file: &mut File, config: &Config) -> Result<Self> {
        Ok(match config.layout {
            Layout::Strided => {
                Placement::Strided(StridedLayout::new(config.dimension, config.slot_stride))
            }
            Layout::Indexed => Placement::Indexed(IndexedLayout::open(file, config.dimension)?),
        })
    }

    /// Slot address of a validated coordinate
    pub fn offset_of(&self, coord: Coord) -> u64 {
        match self {
            Placement::Strided(l) => l.offset_of(coord),
            Placement::Indexed(l) => l.offset_of(coord),
        }
    }

    pub fn put(&self, file: &mut File, coord: Coord, document: &Document) -> Result<()> {
        match self {
            Placement::Strided(l) => l.put(file, coord, document),
            Placement::Indexed(l) => l.put(file, coord, document),
        }
    }

    pub fn get(&self, file: &mut File, coord: Coord) -> Result<Document> {
        match self {
            Placement::Strided(l) => l.get(file, coord),
            Placement::Indexed(l) => l.get(file, coord),
        }
    }

    pub fn delete(&self, file: &mut File, coord: Coord) -> Result<usize> {
        match self {
            Placement::Strided(l) => l.delete(file, coord),
            Placement::Indexed(l) => l.delete(file, coord),
        }
    }

    /// Reclaim dead space. Returns a replacement handle when the file was
    /// rewritten.
    pub fn compact(&self, file: &mut File, path: &Path) -> Result<Option<File>> {
        match self {
            // Delete already packs the tail
            Placement::Strided(_) => Ok(None),
            Placement::Indexed(l) => l.compact(file, path).map(Some),
        }
    }
}
