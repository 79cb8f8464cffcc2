//! Uniform dipole field.

use nalgebra::Vector3;

use crate::error::ElementError;
use crate::strength::ElementStrength;
use crate::types::FieldValue;

use super::FieldSource;

/// Constant magnetic field `field · û` everywhere in the local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendField {
    b: [f64; 3],
}

impl BendField {
    /// Build from the `field` strength (T) and a direction, which is
    /// normalised here.
    pub fn new(strength: &ElementStrength, direction: [f64; 3]) -> Result<Self, ElementError> {
        let field = strength.require("field")?;
        let unit = Vector3::from(direction)
            .try_normalize(f64::EPSILON)
            .ok_or(ElementError::InvalidParameter {
                name: "field direction",
                value: 0.0,
                reason: "direction must have nonzero length",
            })?;
        let b = unit * field;
        log::debug!("Bend field B = [{:.4e}, {:.4e}, {:.4e}] T", b.x, b.y, b.z);
        Ok(Self { b: b.into() })
    }

    /// Vertical field of strength `field`, bending in the horizontal plane.
    pub fn vertical(strength: &ElementStrength) -> Result<Self, ElementError> {
        Self::new(strength, [0.0, 1.0, 0.0])
    }

    pub fn b(&self) -> [f64; 3] {
        self.b
    }
}

impl FieldSource for BendField {
    fn field(&self, _position: &[f64; 3], _t: f64) -> FieldValue {
        FieldValue::magnetic(self.b)
    }
}
