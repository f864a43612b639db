//! Error types for CubeStore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::coord::Coord;

/// Result type alias using CubeError
pub type Result<T> = std::result::Result<T, CubeError>;

/// Unified error type for CubeStore operations
#[derive(Debug, Error)]
pub enum CubeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("Coordinate {coord} out of bounds for cube of dimension {dimension}")]
    OutOfBounds { coord: Coord, dimension: u32 },

    #[error("Document not found at {coord}")]
    NotFound { coord: Coord },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Record decode failed: {0}")]
    Decode(String),

    #[error("Record encode failed: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
