//! Cube coordinates
//!
//! A `Coord` names one cell of the N×N×N cube. Components are signed so
//! that negative input reaches bounds validation instead of wrapping.

use std::fmt;

use crate::error::{CubeError, Result};

/// A cell position `(x, y, z)` inside the cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coord {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Reject any component outside `[0, dimension)`
    pub fn validate(self, dimension: u32) -> Result<Self> {
        let n = i64::from(dimension);
        let in_range = |c: i64| (0..n).contains(&c);

        if in_range(self.x) && in_range(self.y) && in_range(self.z) {
            Ok(self)
        } else {
            Err(CubeError::OutOfBounds {
                coord: self,
                dimension,
            })
        }
    }

    /// Scan-order index: `z*N*N + y*N + x`
    ///
    /// Callers validate first; the result is only meaningful in bounds and
    /// does not overflow for any dimension accepted by `Config::validate`.
    pub fn linear(self, dimension: u32) -> u64 {
        let n = u64::from(dimension);
        self.z as u64 * n * n + self.y as u64 * n + self.x as u64
    }

    /// Inverse of [`Coord::linear`]
    pub fn from_linear(index: u64, dimension: u32) -> Self {
        let n = u64::from(dimension);
        Self {
            x: (index % n) as i64,
            y: ((index / n) % n) as i64,
            z: (index / (n * n)) as i64,
        }
    }

    /// Every coordinate of the cube in scan order (z outermost, x innermost),
    /// which is also file order for both layouts.
    pub fn iter_cube(dimension: u32) -> impl Iterator<Item = Coord> {
        let n = u64::from(dimension);
        let cells = n.saturating_mul(n).saturating_mul(n);
        (0..cells).map(move |i| Coord::from_linear(i, dimension))
    }
}

impl From<(i64, i64, i64)> for Coord {
    fn from((x, y, z): (i64, i64, i64)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
