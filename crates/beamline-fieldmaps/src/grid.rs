//! Tabulated field maps sampled on regular grids.
//!
//! A map owns its samples (three field components per node), the axis
//! descriptions, and two unit factors: `length_unit` converts a query
//! coordinate in metres into map units, and `field_unit` converts the
//! interpolated value into the caller's field unit.
//!
//! Lookup policy:
//! 1. Convert to map units, subtract the per-axis offset, and reflect
//!    mirrored axes (flipping the components that are odd under the
//!    reflection, see [`MirrorParity`]).
//! 2. Outside the sampled region on any axis the field is exactly zero.
//! 3. Otherwise interpolate linearly and apply `field_unit`.

use ndarray::{Array2, Array4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpolator::{interpolate_1d, interpolate_3d, CellIndex, GridAxis};

/// Errors raised while building or loading a field map.
#[derive(Debug, Error)]
pub enum FieldMapError {
    #[error("Failed to read field map: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Axis {axis} needs at least 2 samples, got {n}")]
    InvalidDimension { axis: char, n: i64 },

    #[error("Axis {axis} has invalid bounds: min={min}, max={max}")]
    InvalidBounds { axis: char, min: f64, max: f64 },

    #[error("Expected {expected} field samples, found {found}")]
    SampleCountMismatch { expected: usize, found: usize },
}

/// How field components transform under reflection of one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorParity {
    /// Polar vector (electric field): the component along the reflected
    /// axis changes sign.
    Vector,
    /// Axial vector (magnetic field): the two components in the mirror
    /// plane change sign.
    #[default]
    Pseudovector,
}

impl MirrorParity {
    /// Sign applied to component `component` after reflecting `axis`.
    fn sign(self, axis: usize, component: usize) -> f64 {
        let flips = match self {
            MirrorParity::Vector => component == axis,
            MirrorParity::Pseudovector => component != axis,
        };
        if flips {
            -1.0
        } else {
            1.0
        }
    }
}

/// Which coordinate a 1D map varies with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapDimension {
    X,
    Y,
    #[default]
    Z,
    /// Time: the map is a waveform, uniform in space.
    T,
}

impl MapDimension {
    pub(crate) fn label(self) -> char {
        match self {
            MapDimension::X => 'x',
            MapDimension::Y => 'y',
            MapDimension::Z => 'z',
            MapDimension::T => 't',
        }
    }
}

/// A field map sampled along one dimension.
#[derive(Debug, Clone)]
pub struct TabulatedField1D {
    axis: GridAxis,
    dimension: MapDimension,
    /// Samples, shape `(n, 3)`.
    values: Array2<f64>,
    /// Query unit → map unit divisor (seconds for [`MapDimension::T`]).
    length_unit: f64,
    field_unit: f64,
    parity: MirrorParity,
}

impl TabulatedField1D {
    /// Build a map from a stream of samples in axis order.
    ///
    /// Fails if the stream does not hold exactly `axis.samples()` values.
    pub fn from_samples<I>(
        axis: GridAxis,
        dimension: MapDimension,
        samples: I,
    ) -> Result<Self, FieldMapError>
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let expected = axis.samples();
        let flat: Vec<f64> = samples.into_iter().flatten().collect();
        let found = flat.len() / 3;
        if found != expected {
            return Err(FieldMapError::SampleCountMismatch { expected, found });
        }
        let values = Array2::from_shape_vec((expected, 3), flat).map_err(|e| {
            FieldMapError::FormatError {
                line: 0,
                message: e.to_string(),
            }
        })?;
        log::debug!(
            "1D field map along {}: {} samples over [{}, {}]",
            dimension.label(),
            expected,
            axis.min(),
            axis.max()
        );
        Ok(Self {
            axis,
            dimension,
            values,
            length_unit: 1.0,
            field_unit: 1.0,
            parity: MirrorParity::default(),
        })
    }

    /// Set the coordinate and field unit factors.
    pub fn with_units(mut self, length_unit: f64, field_unit: f64) -> Self {
        self.length_unit = length_unit;
        self.field_unit = field_unit;
        self
    }

    pub fn with_parity(mut self, parity: MirrorParity) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.axis = self.axis.with_offset(offset);
        self
    }

    pub fn with_inversion(mut self, inverted: bool) -> Self {
        self.axis = self.axis.with_inversion(inverted);
        self
    }

    pub fn axis(&self) -> &GridAxis {
        &self.axis
    }

    pub fn dimension(&self) -> MapDimension {
        self.dimension
    }

    /// Interpolated field at a point (m) and time (s).
    pub fn field_at(&self, point: &[f64; 3], t: f64) -> [f64; 3] {
        let (query, axis_index) = match self.dimension {
            MapDimension::X => (point[0], Some(0)),
            MapDimension::Y => (point[1], Some(1)),
            MapDimension::Z => (point[2], Some(2)),
            MapDimension::T => (t, None),
        };
        let (coord, reflected) = self.axis.to_map_coordinate(query / self.length_unit);
        let Some(cell) = self.axis.locate(coord) else {
            return [0.0; 3];
        };

        let mut field = interpolate_1d(self.values.view(), cell);
        for (c, f) in field.iter_mut().enumerate() {
            let sign = match (reflected, axis_index) {
                (true, Some(a)) => self.parity.sign(a, c),
                _ => 1.0,
            };
            *f *= sign * self.field_unit;
        }
        field
    }
}

/// A field map sampled on a regular 3D grid.
#[derive(Debug, Clone)]
pub struct TabulatedField3D {
    axes: [GridAxis; 3],
    /// Samples, shape `(nx, ny, nz, 3)`.
    values: Array4<f64>,
    length_unit: f64,
    field_unit: f64,
    parity: MirrorParity,
}

impl TabulatedField3D {
    /// Build a map from a stream of samples, `x` outermost and `z` innermost.
    ///
    /// Fails if the stream does not hold exactly `nx * ny * nz` values.
    pub fn from_samples<I>(axes: [GridAxis; 3], samples: I) -> Result<Self, FieldMapError>
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let shape = (axes[0].samples(), axes[1].samples(), axes[2].samples());
        let expected = shape
            .0
            .checked_mul(shape.1)
            .and_then(|n| n.checked_mul(shape.2))
            .filter(|n| n.checked_mul(3).is_some())
            .ok_or_else(|| FieldMapError::FormatError {
                line: 0,
                message: format!("Grid of {:?} samples overflows", shape),
            })?;
        let flat: Vec<f64> = samples.into_iter().flatten().collect();
        let found = flat.len() / 3;
        if found != expected {
            return Err(FieldMapError::SampleCountMismatch { expected, found });
        }
        let values = Array4::from_shape_vec((shape.0, shape.1, shape.2, 3), flat).map_err(|e| {
            FieldMapError::FormatError {
                line: 0,
                message: e.to_string(),
            }
        })?;
        log::debug!(
            "3D field map: {}x{}x{} samples, x [{}, {}], y [{}, {}], z [{}, {}]",
            shape.0,
            shape.1,
            shape.2,
            axes[0].min(),
            axes[0].max(),
            axes[1].min(),
            axes[1].max(),
            axes[2].min(),
            axes[2].max()
        );
        Ok(Self {
            axes,
            values,
            length_unit: 1.0,
            field_unit: 1.0,
            parity: MirrorParity::default(),
        })
    }

    /// Set the length and field unit factors.
    pub fn with_units(mut self, length_unit: f64, field_unit: f64) -> Self {
        self.length_unit = length_unit;
        self.field_unit = field_unit;
        self
    }

    pub fn with_parity(mut self, parity: MirrorParity) -> Self {
        self.parity = parity;
        self
    }

    /// Shift the map origin on each axis (map units).
    pub fn with_offsets(mut self, offsets: [f64; 3]) -> Self {
        for (axis, offset) in self.axes.iter_mut().zip(offsets) {
            *axis = axis.with_offset(offset);
        }
        self
    }

    /// Enable mirror symmetry per axis.
    pub fn with_inversions(mut self, inversions: [bool; 3]) -> Self {
        for (axis, inverted) in self.axes.iter_mut().zip(inversions) {
            *axis = axis.with_inversion(inverted);
        }
        self
    }

    pub fn axes(&self) -> &[GridAxis; 3] {
        &self.axes
    }

    /// Interpolated field at a point (m). Static maps ignore time.
    pub fn field_at(&self, point: &[f64; 3]) -> [f64; 3] {
        let mut cells = [CellIndex { base: 0, frac: 0.0 }; 3];
        let mut signs = [1.0; 3];

        for (a, axis) in self.axes.iter().enumerate() {
            let (coord, reflected) = axis.to_map_coordinate(point[a] / self.length_unit);
            let Some(cell) = axis.locate(coord) else {
                return [0.0; 3];
            };
            cells[a] = cell;
            if reflected {
                for (c, s) in signs.iter_mut().enumerate() {
                    *s *= self.parity.sign(a, c);
                }
            }
        }

        let mut field = interpolate_3d(self.values.view(), cells);
        for (f, s) in field.iter_mut().zip(signs) {
            *f *= s * self.field_unit;
        }
        field
    }
}

/// Either kind of loaded map.
#[derive(Debug, Clone)]
pub enum FieldMap {
    OneD(TabulatedField1D),
    ThreeD(TabulatedField3D),
}

impl FieldMap {
    pub fn field_at(&self, point: &[f64; 3], t: f64) -> [f64; 3] {
        match self {
            FieldMap::OneD(map) => map.field_at(point, t),
            FieldMap::ThreeD(map) => map.field_at(point),
        }
    }

    /// Apply unit factors regardless of the map's dimensionality.
    pub fn with_units(self, length_unit: f64, field_unit: f64) -> Self {
        match self {
            FieldMap::OneD(map) => FieldMap::OneD(map.with_units(length_unit, field_unit)),
            FieldMap::ThreeD(map) => FieldMap::ThreeD(map.with_units(length_unit, field_unit)),
        }
    }

    pub fn with_parity(self, parity: MirrorParity) -> Self {
        match self {
            FieldMap::OneD(map) => FieldMap::OneD(map.with_parity(parity)),
            FieldMap::ThreeD(map) => FieldMap::ThreeD(map.with_parity(parity)),
        }
    }
}
