//! # Beamline Field Maps
//!
//! Tabulated electromagnetic field maps for beamline elements. Field
//! values are sampled on regular grids and evaluated by multilinear
//! interpolation.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`interpolator`] | Grid axes, cell location, 1D/3D linear interpolation |
//! | [`grid`] | [`TabulatedField1D`], [`TabulatedField3D`], symmetry handling |
//! | [`parser`] | Plain-text grid file loader |
//!
//! Maps are immutable once built; evaluation never fails and returns a
//! zero field outside the sampled region.

pub mod grid;
pub mod interpolator;
pub mod parser;

pub use grid::{FieldMap, FieldMapError, MapDimension, MirrorParity, TabulatedField1D, TabulatedField3D};
pub use interpolator::{CellIndex, GridAxis};
pub use parser::{load_field_map, parse_field_map};
