//! Regular-grid index/weight computation and multilinear interpolation.
//!
//! A [`GridAxis`] describes one sampled dimension: `n` equally spaced nodes
//! between `min` and `max` inclusive, so the cell size is
//! $(\text{max} - \text{min})/(n - 1)$. Locating a coordinate yields the
//! lower node of the enclosing cell and the fractional position inside it;
//! the interpolation routines then weight the cell corners by
//! $(1 - f)$ and $f$ per axis.
//!
//! Coordinates outside `[min, max]` are never extrapolated: [`GridAxis::locate`]
//! returns `None` and the caller decides what that means.

use ndarray::{ArrayView2, ArrayView4};
use serde::{Deserialize, Serialize};

use crate::grid::FieldMapError;

/// One regularly sampled axis of a field map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    label: char,
    n: usize,
    min: f64,
    max: f64,
    cell: f64,
    offset: f64,
    inverted: bool,
}

/// Position of a coordinate inside the grid along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellIndex {
    /// Index of the lower node of the enclosing cell, in `[0, n - 2]`.
    pub base: usize,
    /// Fractional position within the cell, in `[0, 1]`.
    pub frac: f64,
}

impl GridAxis {
    /// Create an axis with `n` nodes spanning `[min, max]` (map units).
    ///
    /// At least two nodes are required so that a cell size exists.
    pub fn new(label: char, n: usize, min: f64, max: f64) -> Result<Self, FieldMapError> {
        if n < 2 {
            return Err(FieldMapError::InvalidDimension {
                axis: label,
                n: n as i64,
            });
        }
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(FieldMapError::InvalidBounds {
                axis: label,
                min,
                max,
            });
        }
        Ok(Self {
            label,
            n,
            min,
            max,
            cell: (max - min) / (n - 1) as f64,
            offset: 0.0,
            inverted: false,
        })
    }

    /// Shift the map origin: queries subtract `offset` before lookup.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Enable mirror symmetry about the (offset) origin of this axis.
    ///
    /// The map then only needs to cover the non-negative half; negative
    /// coordinates are reflected before lookup.
    pub fn with_inversion(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn label(&self) -> char {
        self.label
    }

    /// Number of nodes along this axis.
    pub fn samples(&self) -> usize {
        self.n
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Coordinate of node `i`.
    pub fn node(&self, i: usize) -> f64 {
        self.min + i as f64 * self.cell
    }

    /// Translate a query coordinate into map coordinates.
    ///
    /// Returns the translated coordinate and whether it was reflected by
    /// the mirror symmetry of this axis.
    pub fn to_map_coordinate(&self, coord: f64) -> (f64, bool) {
        let local = coord - self.offset;
        if self.inverted && local < 0.0 {
            (-local, true)
        } else {
            (local, false)
        }
    }

    /// Find the cell enclosing a map coordinate.
    ///
    /// Returns `None` if the coordinate lies outside `[min, max]` (or is NaN).
    pub fn locate(&self, coord: f64) -> Option<CellIndex> {
        if !(coord >= self.min && coord <= self.max) {
            return None;
        }
        let idx = (coord - self.min) / self.cell;
        let base = (idx.floor() as usize).min(self.n - 2);
        Some(CellIndex {
            base,
            frac: idx - base as f64,
        })
    }
}

/// Interpolate a 1D table of 3-component samples, shape `(n, 3)`.
pub fn interpolate_1d(values: ArrayView2<'_, f64>, cell: CellIndex) -> [f64; 3] {
    let i = cell.base;
    let f = cell.frac;
    let mut out = [0.0; 3];
    for (c, o) in out.iter_mut().enumerate() {
        *o = (1.0 - f) * values[[i, c]] + f * values[[i + 1, c]];
    }
    out
}

/// Interpolate a 3D table of 3-component samples, shape `(nx, ny, nz, 3)`.
///
/// Each of the eight cell corners is weighted by the product of its
/// per-axis weights.
pub fn interpolate_3d(values: ArrayView4<'_, f64>, cells: [CellIndex; 3]) -> [f64; 3] {
    let [cx, cy, cz] = cells;
    let wx = [1.0 - cx.frac, cx.frac];
    let wy = [1.0 - cy.frac, cy.frac];
    let wz = [1.0 - cz.frac, cz.frac];

    let mut out = [0.0; 3];
    for (dx, wxi) in wx.iter().enumerate() {
        for (dy, wyi) in wy.iter().enumerate() {
            for (dz, wzi) in wz.iter().enumerate() {
                let w = wxi * wyi * wzi;
                let (i, j, k) = (cx.base + dx, cy.base + dy, cz.base + dz);
                for (c, o) in out.iter_mut().enumerate() {
                    *o += w * values[[i, j, k, c]];
                }
            }
        }
    }
    out
}
