//! Sequential placement of elements along the beamline.
//!
//! Elements are laid end to end: each one is centred half its length
//! downstream of the previous exit point, along the current beam axis.
//! An element built from imported sub-geometry may instead pin its entry
//! and/or exit to an [`AttachmentFrame`]; the placement then re-anchors
//! the beam axis so that downstream elements follow the attachment rather
//! than the nominal axis.

use nalgebra::{Rotation3, Vector3};
use thiserror::Error;

use crate::transform::CoordinateTransform;

/// Errors raised while laying out the beamline.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Element length must be finite and non-negative, got {0}")]
    InvalidLength(f64),
}

/// An attachment frame expressed in the element's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentFrame {
    /// Orientation of the frame relative to the element axes.
    pub rotation: Rotation3<f64>,
    /// Origin of the frame in element coordinates (m).
    pub translation: Vector3<f64>,
}

/// Optional entry and exit attachments of one element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttachmentFrames {
    pub entry: Option<AttachmentFrame>,
    pub exit: Option<AttachmentFrame>,
}

impl AttachmentFrames {
    /// No attachments: the element follows the nominal axis.
    pub fn nominal() -> Self {
        Self::default()
    }
}

/// Running state of the beamline layout.
#[derive(Debug, Clone)]
pub struct BeamlinePlacement {
    /// Accumulated rotation of the beam axis.
    rotation: Rotation3<f64>,
    /// Global position where the last placed element ended.
    exit_point: Vector3<f64>,
    /// Running longitudinal position (m).
    s: f64,
}

impl Default for BeamlinePlacement {
    fn default() -> Self {
        Self {
            rotation: Rotation3::identity(),
            exit_point: Vector3::zeros(),
            s: 0.0,
        }
    }
}

impl BeamlinePlacement {
    /// Start a beamline at the global origin pointing along `+z`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a beamline at an arbitrary point and orientation.
    pub fn starting_at(position: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        Self {
            rotation,
            exit_point: position,
            s: 0.0,
        }
    }

    /// Accumulated rotation of the beam axis.
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Global point where the next element will start.
    pub fn exit_point(&self) -> [f64; 3] {
        [self.exit_point.x, self.exit_point.y, self.exit_point.z]
    }

    /// Running longitudinal position (m).
    pub fn s(&self) -> f64 {
        self.s
    }

    /// Place the next element and advance the running placement.
    ///
    /// Returns the element's local → global transform.
    pub fn place(
        &mut self,
        length: f64,
        anchors: &AttachmentFrames,
    ) -> Result<CoordinateTransform, PlacementError> {
        if !length.is_finite() || length < 0.0 {
            return Err(PlacementError::InvalidLength(length));
        }

        let axis = self.rotation * Vector3::z();
        let nominal_centre = self.exit_point + axis * (length / 2.0);

        let (rotation, centre) = match &anchors.entry {
            None => (self.rotation, nominal_centre),
            Some(entry) => {
                // Turn the element so the entry frame's z lies on the beam
                // axis, then shift it sideways so the beam threads the
                // entry origin. The longitudinal centre stays nominal.
                let rotation = self.rotation * entry.rotation.inverse();
                let offset = rotation * entry.translation;
                let transverse = offset - axis * offset.dot(&axis);
                (rotation, nominal_centre - transverse)
            }
        };

        let element = CoordinateTransform::new(rotation, centre);

        match &anchors.exit {
            None => {
                self.rotation = rotation;
                self.exit_point = centre + rotation * Vector3::z() * (length / 2.0);
            }
            Some(exit) => {
                log::debug!(
                    "Re-anchoring beam axis to exit frame at local ({:.4}, {:.4}, {:.4})",
                    exit.translation.x,
                    exit.translation.y,
                    exit.translation.z
                );
                self.rotation = rotation * exit.rotation;
                self.exit_point = rotation * exit.translation + centre;
            }
        }
        self.s += length;

        Ok(element)
    }
}
