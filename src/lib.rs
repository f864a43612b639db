//! # CubeStore
//!
//! A single-file document store that addresses records by a cube coordinate
//! `(x, y, z)` instead of by key:
//! - Documents are string-keyed maps of dynamically typed values
//! - Each document is stored as a self-describing, length-prefixed record
//! - Two file layouts: stride-addressed slots, or a slot table
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CubeStore                             │
//! │            put / get / delete / scan / compact               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Coord::validate
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Strided   │          │   Indexed   │
//!   │ (offset by  │          │ (slot table │
//!   │  formula)   │          │  + appends) │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌─────────────┐
//!               │   Record    │
//!               │ (len + CRC  │
//!               │  + bincode) │
//!               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod coord;
pub mod document;
pub mod record;
pub mod layout;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CubeError, Result};
pub use config::{Config, Layout, SyncStrategy};
pub use coord::Coord;
pub use document::{DisplayDocument, Document, Value};
pub use store::CubeStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CubeStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
