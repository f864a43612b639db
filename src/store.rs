//! Store Module
//!
//! `CubeStore` owns the backing file and the cube dimension and exposes the
//! coordinate-addressed document operations.
//!
//! ## Access Model
//! Single-threaded and blocking. Every operation takes `&mut self` because
//! it moves the file cursor, so one store runs one operation at a time.
//! Sharing a file between stores or threads needs external serialization.

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::config::{Config, SyncStrategy};
use crate::coord::Coord;
use crate::document::Document;
use crate::error::{CubeError, Result};
use crate::layout::Placement;

/// A document store addressed by cube coordinates
pub struct CubeStore {
    /// Store configuration (path, dimension, layout)
    config: Config,

    /// Exclusively owned backing file
    file: File,

    /// How coordinates map onto `file`
    placement: Placement,
}

impl CubeStore {
    /// Open or create a store with the given config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.path)?;

        let placement = Placement::open(&mut file, &config)?;

        tracing::info!(
            "Opened cube store at {} (dimension {}, layout {:?})",
            config.path.display(),
            config.dimension,
            config.layout
        );

        Ok(Self {
            config,
            file,
            placement,
        })
    }

    /// Open with a path and dimension (convenience method)
    ///
    /// Uses the default strided layout.
    pub fn open_path(path: impl AsRef<Path>, dimension: u32) -> Result<Self> {
        let config = Config::builder()
            .path(path.as_ref())
            .dimension(dimension)
            .build();
        Self::open(config)
    }

    /// Store a document at `coord`
    ///
    /// With the strided layout this discards every document stored at a
    /// higher offset.
    pub fn put(&mut self, coord: impl Into<Coord>, document: &Document) -> Result<()> {
        let coord = coord.into().validate(self.config.dimension)?;
        self.placement.put(&mut self.file, coord, document)?;
        self.sync_if_needed()
    }

    /// Fetch the document at `coord`
    pub fn get(&mut self, coord: impl Into<Coord>) -> Result<Document> {
        let coord = coord.into().validate(self.config.dimension)?;
        self.placement.get(&mut self.file, coord)
    }

    /// Remove the document at `coord`
    ///
    /// With the strided layout every later record shifts back into the freed
    /// space. Returns how many records were moved. Not atomic: a failure
    /// after the cut can lose the shifted records.
    pub fn delete(&mut self, coord: impl Into<Coord>) -> Result<usize> {
        let coord = coord.into().validate(self.config.dimension)?;
        let moved = self.placement.delete(&mut self.file, coord)?;
        self.sync_if_needed()?;
        Ok(moved)
    }

    /// Every readable document, in scan order
    ///
    /// Empty and malformed slots are skipped; I/O errors propagate.
    pub fn scan(&mut self) -> Result<Vec<(Coord, Document)>> {
        let mut found = Vec::new();

        for coord in Coord::iter_cube(self.config.dimension) {
            match self.placement.get(&mut self.file, coord) {
                Ok(document) => found.push((coord, document)),
                Err(CubeError::NotFound { .. }) => {}
                Err(CubeError::Decode(reason)) => {
                    tracing::trace!("Skipping unreadable slot {}: {}", coord, reason);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(found)
    }

    /// Reclaim space held by deleted records (indexed layout)
    pub fn compact(&mut self) -> Result<()> {
        if let Some(file) = self.placement.compact(&mut self.file, &self.config.path)? {
            self.file = file;
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Close the store gracefully
    ///
    /// Syncs and releases the file handle. The file itself is left in place.
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        tracing::info!("Closed cube store at {}", self.config.path.display());
        Ok(())
    }

    fn sync_if_needed(&mut self) -> Result<()> {
        if self.config.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Cells per axis
    pub fn dimension(&self) -> u32 {
        self.config.dimension
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current length of the backing file
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Slot address of `coord`
    ///
    /// The record offset for the strided layout, the slot table entry
    /// position for the indexed layout.
    pub fn offset_of(&self, coord: impl Into<Coord>) -> Result<u64> {
        let coord = coord.into().validate(self.config.dimension)?;
        Ok(self.placement.offset_of(coord))
    }
}
