//! # Beamline Geometry
//!
//! Frame bookkeeping for beamline elements. This crate provides:
//!
//! - **Transforms** ([`transform`]) — The rigid local ⇄ global mapping of a
//!   single element, applied to position/direction pairs.
//! - **Placement** ([`placement`]) — The running placement of successive
//!   elements along the beamline, including re-anchoring to attachment
//!   frames of imported sub-geometry.

pub mod placement;
pub mod transform;

pub use placement::{AttachmentFrame, AttachmentFrames, BeamlinePlacement, PlacementError};
pub use transform::CoordinateTransform;
