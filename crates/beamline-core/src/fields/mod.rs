//! Element field sources.
//!
//! Every source answers the same query: the magnetic and electric field at
//! a position in the element's local frame at time `t`. The [`FieldSource`]
//! trait is that interface; [`ElementField`] is the closed set of sources
//! an element can own.
//!
//! Queries never fail. Points a source cannot describe (outside a map,
//! on a singular axis) return a zero or regularised field instead.

pub mod bend;
pub mod cavity;
pub mod undulator;

use beamline_fieldmaps::{FieldMap, MapDimension};
use serde::{Deserialize, Serialize};

use crate::types::FieldValue;

pub use bend::BendField;
pub use cavity::{CavityParameters, CircularTmField, CylindricalField, TimeReference};
pub use undulator::UndulatorField;

/// A field defined in an element's local frame.
pub trait FieldSource: Send + Sync {
    /// Field at a local position (m) and time (s).
    fn field(&self, position: &[f64; 3], t: f64) -> FieldValue;

    /// Whether the field depends on time.
    fn time_varying(&self) -> bool {
        false
    }

    /// Whether the source is strong enough to affect a particle.
    fn has_finite_strength(&self) -> bool {
        true
    }
}

/// Which half of [`FieldValue`] a tabulated map fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Magnetic,
    Electric,
}

/// A tabulated field map interpreted as a magnetic or electric field.
#[derive(Debug, Clone)]
pub struct MappedField {
    map: FieldMap,
    kind: FieldKind,
}

impl MappedField {
    pub fn new(map: FieldMap, kind: FieldKind) -> Self {
        Self { map, kind }
    }

    pub fn map(&self) -> &FieldMap {
        &self.map
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl FieldSource for MappedField {
    fn field(&self, position: &[f64; 3], t: f64) -> FieldValue {
        let value = self.map.field_at(position, t);
        match self.kind {
            FieldKind::Magnetic => FieldValue::magnetic(value),
            FieldKind::Electric => FieldValue::electric(value),
        }
    }

    fn time_varying(&self) -> bool {
        matches!(&self.map, FieldMap::OneD(m) if m.dimension() == MapDimension::T)
    }
}

/// The field owned by a beamline element.
#[derive(Debug, Clone)]
pub enum ElementField {
    Bend(BendField),
    Undulator(UndulatorField),
    Cavity(CircularTmField),
    Mapped(MappedField),
}

impl ElementField {
    /// Short name of the source type, for logs and reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementField::Bend(_) => "bend",
            ElementField::Undulator(_) => "undulator",
            ElementField::Cavity(_) => "cavity",
            ElementField::Mapped(_) => "fieldmap",
        }
    }

    fn source(&self) -> &dyn FieldSource {
        match self {
            ElementField::Bend(f) => f,
            ElementField::Undulator(f) => f,
            ElementField::Cavity(f) => f,
            ElementField::Mapped(f) => f,
        }
    }
}

impl FieldSource for ElementField {
    fn field(&self, position: &[f64; 3], t: f64) -> FieldValue {
        self.source().field(position, t)
    }

    fn time_varying(&self) -> bool {
        self.source().time_varying()
    }

    fn has_finite_strength(&self) -> bool {
        self.source().has_finite_strength()
    }
}

impl From<BendField> for ElementField {
    fn from(f: BendField) -> Self {
        ElementField::Bend(f)
    }
}

impl From<UndulatorField> for ElementField {
    fn from(f: UndulatorField) -> Self {
        ElementField::Undulator(f)
    }
}

impl From<CircularTmField> for ElementField {
    fn from(f: CircularTmField) -> Self {
        ElementField::Cavity(f)
    }
}

impl From<MappedField> for ElementField {
    fn from(f: MappedField) -> Self {
        ElementField::Mapped(f)
    }
}
