//! Construction-time errors for field sources and integrators.
//!
//! Evaluation and stepping never fail; every error in this crate is raised
//! while an element is being built from its declared parameters.

use beamline_fieldmaps::FieldMapError;
use thiserror::Error;

/// Problems with a named strength map.
#[derive(Debug, Error)]
pub enum StrengthError {
    #[error("Missing required strength parameter '{0}'")]
    Missing(String),

    #[error("Strength parameter '{key}' must be a non-negative integer, got {value}")]
    NotAnIndex { key: String, value: f64 },
}

/// Errors raised while building an element's field source or integrator.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error(transparent)]
    Strength(#[from] StrengthError),

    #[error("Invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Cavity mode m={m}, n={n} is outside the tabulated range (m <= 9, 1 <= n <= 10)")]
    UnsupportedMode { m: usize, n: usize },

    #[error("Field map error: {0}")]
    FieldMap(#[from] FieldMapError),
}
