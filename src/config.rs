//! Configuration for CubeStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CubeError, Result};
use crate::layout::{HEADER_SIZE, SLOT_ENTRY_SIZE};
use crate::record::{MAX_RECORD_SIZE, RECORD_HEADER_SIZE};

/// Default nominal slot spacing in bytes
///
/// Matches the in-memory footprint of a generic key/value holder on a
/// 64-bit target (two-word string header + two-word interface header).
pub const DEFAULT_SLOT_STRIDE: u64 = 32;

/// Default cube dimension (3×3×3)
pub const DEFAULT_DIMENSION: u32 = 3;

/// Main configuration for a CubeStore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing file. Created if absent, never removed by the store.
    pub path: PathBuf,

    /// Cells per axis (N). Not persisted by the strided layout, so reopen
    /// with the same value.
    pub dimension: u32,

    /// How coordinates are mapped onto the file
    pub layout: Layout,

    /// Nominal bytes reserved per slot (strided layout only)
    pub slot_stride: u64,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync the backing file
    pub sync_strategy: SyncStrategy,
}

/// Placement of documents inside the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Offset-by-formula slots. Put truncates everything after the written
    /// slot and Delete shifts later records back into the hole.
    #[default]
    Strided,

    /// Header + coordinate slot table + append-only data region.
    /// Slots are independent; garbage is reclaimed by `compact`.
    Indexed,
}

/// File sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// fsync after every Put/Delete (safest, slowest)
    EveryWrite,

    /// fsync only on explicit `sync()` / `close()`
    #[default]
    OnClose,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./document_cube.bin"),
            dimension: DEFAULT_DIMENSION,
            layout: Layout::default(),
            slot_stride: DEFAULT_SLOT_STRIDE,
            sync_strategy: SyncStrategy::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make addressing meaningless
    ///
    /// Every byte offset the layout can produce, plus room for the largest
    /// record behind it, must fit in a u64.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(CubeError::Config("dimension must be at least 1".into()));
        }
        if self.layout == Layout::Strided && self.slot_stride == 0 {
            return Err(CubeError::Config("slot_stride must be at least 1".into()));
        }

        if self.address_space().is_none() {
            return Err(CubeError::Config(format!(
                "dimension {} is too large to address with the {:?} layout",
                self.dimension, self.layout
            )));
        }
        Ok(())
    }

    /// Total number of cells (N³), `None` on overflow
    pub fn cell_count(&self) -> Option<u64> {
        let n = u64::from(self.dimension);
        n.checked_mul(n)?.checked_mul(n)
    }

    /// Highest byte offset the layout may touch
    fn address_space(&self) -> Option<u64> {
        let cells = self.cell_count()?;
        let max_record = RECORD_HEADER_SIZE + u64::from(MAX_RECORD_SIZE);

        match self.layout {
            Layout::Strided => cells
                .checked_mul(self.slot_stride)?
                .checked_add(max_record),
            Layout::Indexed => cells
                .checked_mul(SLOT_ENTRY_SIZE)?
                .checked_add(HEADER_SIZE)?
                .checked_add(max_record),
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the number of cells per axis
    pub fn dimension(mut self, n: u32) -> Self {
        self.config.dimension = n;
        self
    }

    /// Set the file layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the nominal slot stride (in bytes)
    pub fn slot_stride(mut self, bytes: u64) -> Self {
        self.config.slot_stride = bytes;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dimension, 3);
        assert_eq!(config.slot_stride, 32);
        assert_eq!(config.layout, Layout::Strided);
        assert_eq!(config.cell_count(), Some(27));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config = Config::builder().dimension(0).build();
        assert!(matches!(config.validate(), Err(CubeError::Config(_))));
    }

    #[test]
    fn test_zero_stride_only_matters_for_strided() {
        let strided = Config::builder().slot_stride(0).build();
        assert!(strided.validate().is_err());

        let indexed = Config::builder()
            .slot_stride(0)
            .layout(Layout::Indexed)
            .build();
        assert!(indexed.validate().is_ok());
    }

    #[test]
    fn test_oversized_dimension_rejected() {
        let strided = Config::builder().dimension(2_000_000).build();
        assert!(matches!(strided.validate(), Err(CubeError::Config(_))));

        // Same dimension fits once the stride is small enough
        let narrow = Config::builder().dimension(2_000_000).slot_stride(1).build();
        assert!(narrow.validate().is_ok());

        let indexed = Config::builder()
            .dimension(2_000_000)
            .layout(Layout::Indexed)
            .build();
        assert!(matches!(indexed.validate(), Err(CubeError::Config(_))));

        let huge = Config::builder().dimension(u32::MAX).build();
        assert_eq!(huge.cell_count(), None);
        assert!(huge.validate().is_err());
    }
}
