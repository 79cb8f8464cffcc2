//! Core types shared across the field and integrator modules.
//!
//! A [`PhaseSpace`] point is frame-agnostic: whether it is local or global
//! depends on which side of a [`CoordinateTransform`] it sits.

use beamline_geometry::CoordinateTransform;
use serde::{Deserialize, Serialize};

/// Position, direction, momentum and time of a tracked particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpace {
    /// Position (m).
    pub position: [f64; 3],
    /// Unit direction of motion (direction cosines).
    pub direction: [f64; 3],
    /// Momentum magnitude, in the caller's unit.
    pub momentum: f64,
    /// Time (s).
    pub time: f64,
}

impl PhaseSpace {
    /// Create a phase-space point, normalising `direction`.
    ///
    /// A zero direction is kept as given.
    pub fn new(position: [f64; 3], direction: [f64; 3], momentum: f64, time: f64) -> Self {
        let len = (direction[0] * direction[0]
            + direction[1] * direction[1]
            + direction[2] * direction[2])
            .sqrt();
        let direction = if len > 0.0 {
            [direction[0] / len, direction[1] / len, direction[2] / len]
        } else {
            direction
        };
        Self {
            position,
            direction,
            momentum,
            time,
        }
    }

    /// Express a global point in the element's local frame.
    pub fn to_local(&self, transform: &CoordinateTransform) -> Self {
        let (position, direction) = transform.global_to_local(&self.position, &self.direction);
        Self {
            position,
            direction,
            ..*self
        }
    }

    /// Express a local point in the global frame.
    pub fn to_global(&self, transform: &CoordinateTransform) -> Self {
        let (position, direction) = transform.local_to_global(&self.position, &self.direction);
        Self {
            position,
            direction,
            ..*self
        }
    }

    /// Straight-line propagation by `length` along the current direction.
    pub fn drifted(&self, length: f64) -> Self {
        let d = self.direction;
        Self {
            position: [
                self.position[0] + d[0] * length,
                self.position[1] + d[1] * length,
                self.position[2] + d[2] * length,
            ],
            ..*self
        }
    }
}

/// Magnetic and electric field at a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Magnetic flux density (T).
    pub b: [f64; 3],
    /// Electric field (V/m).
    pub e: [f64; 3],
}

impl FieldValue {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn magnetic(b: [f64; 3]) -> Self {
        Self { b, e: [0.0; 3] }
    }

    pub fn electric(e: [f64; 3]) -> Self {
        Self { b: [0.0; 3], e }
    }

    /// Magnitude of the magnetic field.
    pub fn b_magnitude(&self) -> f64 {
        (self.b[0] * self.b[0] + self.b[1] * self.b[1] + self.b[2] * self.b[2]).sqrt()
    }

    /// Magnitude of the electric field.
    pub fn e_magnitude(&self) -> f64 {
        (self.e[0] * self.e[0] + self.e[1] * self.e[1] + self.e[2] * self.e[2]).sqrt()
    }
}
