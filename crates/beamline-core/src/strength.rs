//! Named element strengths.
//!
//! Element parameters arrive as a string-keyed map of numbers, e.g.
//! `efield`, `cavity_radius`, `rmat11`, `kick1`, `field`. Unknown keys are
//! ignored by the consumers; missing required keys are reported as
//! [`StrengthError::Missing`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StrengthError;

/// Magnitudes below this are treated as zero strength.
pub const FINITE_STRENGTH_TOLERANCE: f64 = f64::EPSILON;

/// Whether a strength is both finite and distinguishable from zero.
pub fn is_finite_strength(value: f64) -> bool {
    value.is_finite() && value.abs() > FINITE_STRENGTH_TOLERANCE
}

/// A string-keyed map of element strength parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStrength(HashMap<String, f64>);

impl ElementStrength {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Value of a required key.
    pub fn require(&self, key: &str) -> Result<f64, StrengthError> {
        self.get(key)
            .ok_or_else(|| StrengthError::Missing(key.to_string()))
    }

    /// Value of an optional key.
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    /// A required key holding a non-negative integer (mode numbers etc.).
    pub fn require_index(&self, key: &str) -> Result<usize, StrengthError> {
        to_index(key, self.require(key)?)
    }

    /// An optional key holding a non-negative integer.
    pub fn index_or(&self, key: &str, default: usize) -> Result<usize, StrengthError> {
        match self.get(key) {
            Some(value) => to_index(key, value),
            None => Ok(default),
        }
    }

    /// An optional boolean flag; any nonzero value is `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v != 0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ElementStrength {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn to_index(key: &str, value: f64) -> Result<usize, StrengthError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(StrengthError::NotAnIndex {
            key: key.to_string(),
            value,
        })
    }
}
