//! # Beamline Core
//!
//! Field evaluation and thin-element transport for tracking charged
//! particles through accelerator beamline elements.
//!
//! ## Architecture
//!
//! Every element field implements the [`fields::FieldSource`] trait, which
//! answers "what are B and E at this local point and time". Elements own
//! one [`fields::ElementField`]: a uniform bend, a planar undulator, an
//! analytic TM-mode cavity ([`fields::CircularTmField`]) or a tabulated
//! map. Particles are advanced by an [`integrator::Integrator`]; the thin
//! transfer-matrix stepper ([`integrator::ThinMatrixIntegrator`]) applies
//! a lumped 6×6 map once per element crossing.
//!
//! Everything here is immutable after construction and `Send + Sync`.
//!
//! ## Modules
//!
//! - [`types`] — Phase-space points and field values.
//! - [`strength`] — Named element strength parameters.
//! - [`bessel`] — Bessel functions of the first kind and their zeros.
//! - [`fields`] — Field source trait and implementations.
//! - [`integrator`] — Drift and thin transfer-matrix steppers.
//! - [`constants`] — Physical constants.
//! - [`error`] — Construction errors.

pub mod bessel;
pub mod constants;
pub mod error;
pub mod fields;
pub mod integrator;
pub mod strength;
pub mod types;

pub use error::{ElementError, StrengthError};
pub use strength::ElementStrength;
pub use types::{FieldValue, PhaseSpace};
