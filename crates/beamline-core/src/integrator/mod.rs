//! Single-step particle integrators.
//!
//! An [`Integrator`] advances a particle, given in global coordinates, by
//! one step length through an element. Steps never fail: whenever a
//! stepper cannot apply its model (step too short, neutral particle,
//! non-paraxial track) it falls back to a straight [`drift`].

pub mod thin_matrix;

use serde::{Deserialize, Serialize};

use crate::types::PhaseSpace;

pub use thin_matrix::{
    ThinMatrixIntegrator, TransferMatrix, PARAXIAL_MAX_TRANSVERSE, PARAXIAL_MIN_FORWARD,
    THIN_KICK_LENGTH_FRACTION,
};

/// Outcome of one integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Post-step state in global coordinates.
    pub state: PhaseSpace,
    /// Per-coordinate error estimate (position, direction).
    pub error: [f64; 6],
    /// Deviation of the true path from the chord between the endpoints (m).
    pub chord_distance: f64,
}

/// Advances a particle through an element by one step.
pub trait Integrator: Send + Sync {
    /// Step `state` (global frame) by `step_length` metres for a particle
    /// of the given charge (units of e).
    fn step(&self, state: &PhaseSpace, charge: f64, step_length: f64) -> StepResult;

    /// Human-readable name of the integration method.
    fn method_name(&self) -> &str;
}

/// Straight-line propagation along the current direction.
///
/// Time and momentum are left unchanged; the error estimate and chord
/// distance are zero.
pub fn drift(state: &PhaseSpace, step_length: f64) -> StepResult {
    StepResult {
        state: state.drifted(step_length),
        error: [0.0; 6],
        chord_distance: 0.0,
    }
}

/// Field-free stepper.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftIntegrator;

impl Integrator for DriftIntegrator {
    fn step(&self, state: &PhaseSpace, _charge: f64, step_length: f64) -> StepResult {
        drift(state, step_length)
    }

    fn method_name(&self) -> &str {
        "drift"
    }
}
