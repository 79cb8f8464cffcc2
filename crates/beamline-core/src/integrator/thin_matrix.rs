//! Thin-element transport by a lumped 6×6 transfer matrix.
//!
//! The element is treated as a single kick applied on the one step that
//! crosses it. In local coordinates the phase-space vector
//! $(x, x', y, y', t, \delta)$ is mapped by
//!
//! $$\mathbf{u}_1 = R\,\mathbf{u}_0 + \mathbf{k}$$
//!
//! where the kick vector $\mathbf{k}$ only acts on the four transverse
//! coordinates. Positions are in metres (scaled by the matrix's
//! `length_unit`), angles are direction cosines. Time and momentum
//! deviations enter as zero since the particle is its own reference;
//! on output `t` is added to the particle time and $\delta$ scales the
//! momentum.

use nalgebra::{Matrix6, Vector6};

use beamline_geometry::CoordinateTransform;

use crate::error::ElementError;
use crate::strength::{is_finite_strength, ElementStrength};
use crate::types::PhaseSpace;

use super::{drift, Integrator, StepResult};

/// Minimum fraction of the element length a step must cover to receive
/// the kick. Shorter steps drift, so a tiny initial step cannot lead to
/// the kick being applied twice.
pub const THIN_KICK_LENGTH_FRACTION: f64 = 0.51;

/// Minimum forward direction cosine for the matrix to be applied.
pub const PARAXIAL_MIN_FORWARD: f64 = 0.9;

/// Maximum transverse direction cosine for the matrix to be applied.
pub const PARAXIAL_MAX_TRANSVERSE: f64 = 0.1;

/// Lumped transfer matrix, kicks and aperture of a thin element.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMatrix {
    /// Linear map over $(x, x', y, y', t, \delta)$.
    r: Matrix6<f64>,
    /// Additive kicks on $(x, x', y, y')$.
    kicks: [f64; 4],
    /// Element length (m).
    length: f64,
    /// Transverse aperture: output `x` and `y` are clamped to `±maximum_radius` (m).
    maximum_radius: f64,
    /// Metres per matrix length unit.
    length_unit: f64,
}

impl TransferMatrix {
    pub fn new(
        r: Matrix6<f64>,
        kicks: [f64; 4],
        length: f64,
        maximum_radius: f64,
    ) -> Result<Self, ElementError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(ElementError::InvalidParameter {
                name: "length",
                value: length,
                reason: "thin element length must be positive",
            });
        }
        if maximum_radius.is_nan() || maximum_radius < 0.0 {
            return Err(ElementError::InvalidParameter {
                name: "maximum_radius",
                value: maximum_radius,
                reason: "aperture must be non-negative",
            });
        }
        Ok(Self {
            r,
            kicks,
            length,
            maximum_radius,
            length_unit: 1.0,
        })
    }

    /// Identity transport with no kicks.
    pub fn identity(length: f64, maximum_radius: f64) -> Result<Self, ElementError> {
        Self::new(Matrix6::identity(), [0.0; 4], length, maximum_radius)
    }

    /// Read `rmat11` … `rmat66` and `kick1` … `kick4` from named strengths.
    ///
    /// Missing matrix entries default to the identity, missing kicks to zero.
    pub fn from_strength(
        strength: &ElementStrength,
        length: f64,
        maximum_radius: f64,
    ) -> Result<Self, ElementError> {
        let r = Matrix6::from_fn(|i, j| {
            let default = if i == j { 1.0 } else { 0.0 };
            strength.get_or(&format!("rmat{}{}", i + 1, j + 1), default)
        });
        let kicks = [1, 2, 3, 4].map(|k| strength.get_or(&format!("kick{k}"), 0.0));
        Self::new(r, kicks, length, maximum_radius)
    }

    /// Set the length unit of the matrix coefficients, in metres.
    pub fn with_length_unit(mut self, length_unit: f64) -> Self {
        self.length_unit = length_unit;
        self
    }

    pub fn r(&self) -> &Matrix6<f64> {
        &self.r
    }

    pub fn kicks(&self) -> [f64; 4] {
        self.kicks
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn maximum_radius(&self) -> f64 {
        self.maximum_radius
    }

    pub fn length_unit(&self) -> f64 {
        self.length_unit
    }

    /// Whether every coefficient, kick, the aperture and the length unit are usable.
    pub fn is_finite(&self) -> bool {
        self.r.iter().all(|v| v.is_finite())
            && self.kicks.iter().all(|v| v.is_finite())
            && !self.maximum_radius.is_nan()
            && is_finite_strength(self.length_unit)
    }
}

/// Applies a [`TransferMatrix`] once per element crossing.
#[derive(Debug, Clone)]
pub struct ThinMatrixIntegrator {
    matrix: TransferMatrix,
    transform: CoordinateTransform,
    finite: bool,
}

impl ThinMatrixIntegrator {
    /// `transform` maps the element's local frame into the global frame.
    pub fn new(matrix: TransferMatrix, transform: CoordinateTransform) -> Self {
        let finite = matrix.is_finite();
        if !finite {
            log::warn!("Transfer matrix has non-finite entries; element will act as a drift");
        }
        log::debug!(
            "Thin matrix element: L = {} m, aperture = {} m, kicks = {:?}",
            matrix.length,
            matrix.maximum_radius,
            matrix.kicks
        );
        Self {
            matrix,
            transform,
            finite,
        }
    }

    pub fn matrix(&self) -> &TransferMatrix {
        &self.matrix
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    /// Apply the matrix to a local paraxial state.
    fn transport(&self, local: &PhaseSpace, step_length: f64) -> PhaseSpace {
        let m = &self.matrix;
        let unit = m.length_unit;
        let [x0, y0, z0] = local.position;
        let [xp0, yp0, _] = local.direction;

        let input = Vector6::new(x0 / unit, xp0, y0 / unit, yp0, 0.0, 0.0);
        let out = m.r * input;

        let radius = m.maximum_radius;
        let x1 = ((out[0] + m.kicks[0]) * unit).max(-radius).min(radius);
        let xp1 = out[1] + m.kicks[1];
        let y1 = ((out[2] + m.kicks[2]) * unit).max(-radius).min(radius);
        let yp1 = out[3] + m.kicks[3];
        let t1 = out[4];
        let delta1 = out[5];

        let zp1 = (1.0 - xp1 * xp1 - yp1 * yp1).max(0.0).sqrt();

        PhaseSpace {
            position: [x1, y1, z0 + step_length],
            direction: [xp1, yp1, zp1],
            momentum: local.momentum * (1.0 + delta1),
            time: local.time + t1,
        }
    }
}

impl Integrator for ThinMatrixIntegrator {
    fn step(&self, state: &PhaseSpace, charge: f64, step_length: f64) -> StepResult {
        let length_fraction = step_length / self.matrix.length;
        if length_fraction < THIN_KICK_LENGTH_FRACTION || !self.finite || !is_finite_strength(charge) {
            return drift(state, step_length);
        }

        let local = state.to_local(&self.transform);
        let [xp, yp, zp] = local.direction;
        if zp < PARAXIAL_MIN_FORWARD || xp.abs() > PARAXIAL_MAX_TRANSVERSE || yp.abs() > PARAXIAL_MAX_TRANSVERSE {
            log::trace!("Non-paraxial direction {:?}; drifting", local.direction);
            return drift(state, step_length);
        }

        let transported = self.transport(&local, step_length);
        StepResult {
            state: transported.to_global(&self.transform),
            error: [0.0; 6],
            chord_distance: 0.0,
        }
    }

    fn method_name(&self) -> &str {
        "thin transfer matrix"
    }
}
