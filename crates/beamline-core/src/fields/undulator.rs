//! Planar undulator: vertical field varying sinusoidally along the axis.

use crate::error::ElementError;
use crate::strength::{is_finite_strength, ElementStrength};
use crate::types::FieldValue;

use super::FieldSource;

/// $B_y = B_0 \cos(2\pi z / \lambda_u)$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UndulatorField {
    peak_field: f64,
    period: f64,
    wavenumber: f64,
}

impl UndulatorField {
    /// Build from `field` (peak field, T) and `length` (period, m).
    pub fn new(strength: &ElementStrength) -> Result<Self, ElementError> {
        let peak_field = strength.require("field")?;
        let period = strength.require("length")?;
        if !(period.is_finite() && period > 0.0) {
            return Err(ElementError::InvalidParameter {
                name: "length",
                value: period,
                reason: "undulator period must be positive",
            });
        }
        Ok(Self {
            peak_field,
            period,
            wavenumber: 2.0 * std::f64::consts::PI / period,
        })
    }

    pub fn peak_field(&self) -> f64 {
        self.peak_field
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

impl FieldSource for UndulatorField {
    fn field(&self, position: &[f64; 3], _t: f64) -> FieldValue {
        FieldValue::magnetic([0.0, self.peak_field * (self.wavenumber * position[2]).cos(), 0.0])
    }

    fn has_finite_strength(&self) -> bool {
        is_finite_strength(self.peak_field)
    }
}
