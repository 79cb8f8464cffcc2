//! TOML configuration deserialisation for beamline jobs.

use beamline_core::fields::FieldKind;
use beamline_core::ElementStrength;
use beamline_fieldmaps::{MapDimension, MirrorParity};
use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub element: ElementConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub particle: Vec<ParticleConfig>,
    #[serde(default)]
    pub probe: Option<ProbeConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The element under study.
#[derive(Debug, Deserialize)]
pub struct ElementConfig {
    #[serde(default = "default_element_name")]
    pub name: String,
    /// Element type: "cavity", "bend", "undulator", "rmatrix", "fieldmap" or "drift".
    #[serde(rename = "type")]
    pub element_type: String,
    /// Element length (m).
    pub length: f64,
    /// Named strengths (`efield`, `rmat11`, `field`, ...).
    #[serde(default)]
    pub strength: ElementStrength,
    /// Transverse aperture for transfer-matrix elements (m).
    #[serde(default = "default_maximum_radius")]
    pub maximum_radius: f64,
    /// Metres per length unit of the transfer-matrix coefficients.
    #[serde(default = "default_unit")]
    pub length_unit: f64,
    /// Field direction for bends (normalised on use).
    #[serde(default = "default_bend_direction")]
    pub direction: [f64; 3],
    #[serde(default)]
    pub fieldmap: Option<FieldMapConfig>,
    #[serde(default)]
    pub placement: PlacementConfig,
}

fn default_element_name() -> String {
    "element".into()
}
fn default_maximum_radius() -> f64 {
    1.0
}
fn default_unit() -> f64 {
    1.0
}
fn default_bend_direction() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

/// A tabulated field map file and how to interpret it.
#[derive(Debug, Deserialize)]
pub struct FieldMapConfig {
    pub file: String,
    /// Variation axis of 1D maps (ignored for 3D maps).
    #[serde(default)]
    pub dimension: MapDimension,
    #[serde(default)]
    pub kind: FieldKind,
    /// Metres (or seconds, for time maps) per map coordinate unit.
    #[serde(default = "default_unit")]
    pub length_unit: f64,
    /// Multiplier applied to interpolated values.
    #[serde(default = "default_unit")]
    pub field_unit: f64,
    /// Defaults to pseudovector for magnetic maps, vector for electric maps.
    #[serde(default)]
    pub parity: Option<MirrorParity>,
    /// Map origin per axis, in map units.
    #[serde(default)]
    pub offsets: [f64; 3],
    /// Mirror symmetry per axis.
    #[serde(default)]
    pub inversions: [bool; 3],
}

/// Where the element sits on the beamline.
#[derive(Debug, Default, Deserialize)]
pub struct PlacementConfig {
    /// Drift length between the line start and the element entrance (m).
    #[serde(default)]
    pub upstream: f64,
    #[serde(default)]
    pub entry: Option<AnchorConfig>,
    #[serde(default)]
    pub exit: Option<AnchorConfig>,
}

/// An attachment frame in element coordinates.
#[derive(Debug, Deserialize)]
pub struct AnchorConfig {
    /// Roll, pitch, yaw (rad).
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Origin (m).
    #[serde(default)]
    pub translation: [f64; 3],
}

/// Stepping parameters.
#[derive(Debug, Deserialize)]
pub struct TrackingConfig {
    /// Step length (m); defaults to the element length.
    #[serde(default)]
    pub step_length: Option<f64>,
    /// Number of steps per particle.
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            step_length: None,
            steps: default_steps(),
        }
    }
}

fn default_steps() -> usize {
    1
}

/// A particle to track, in global coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticleConfig {
    pub position: [f64; 3],
    #[serde(default = "default_direction")]
    pub direction: [f64; 3],
    pub momentum: f64,
    #[serde(default)]
    pub time: f64,
    /// Charge in units of e.
    #[serde(default = "default_charge")]
    pub charge: f64,
}

fn default_direction() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}
fn default_charge() -> f64 {
    1.0
}

/// A straight line of probe points in the element's local frame.
#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
    pub start: [f64; 3],
    pub end: [f64; 3],
    #[serde(default = "default_probe_points")]
    pub points: usize,
    /// Evaluation time (s).
    #[serde(default)]
    pub time: f64,
}

fn default_probe_points() -> usize {
    101
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to write CSV tables (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also write JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rmatrix_job_parses() {
        let job: JobConfig = toml::from_str(
            r#"
            [element]
            type = "rmatrix"
            length = 0.1
            maximum_radius = 0.02
            strength = { rmat21 = -2.0, kick2 = 1e-4 }

            [tracking]
            steps = 3

            [[particle]]
            position = [0.001, 0.0, -0.05]
            momentum = 1.0

            [[particle]]
            position = [0.0, 0.001, -0.05]
            momentum = 1.0
            charge = -1.0
            "#,
        )
        .unwrap();
        assert_eq!(job.element.element_type, "rmatrix");
        assert_eq!(job.element.strength.get("rmat21"), Some(-2.0));
        assert_eq!(job.tracking.steps, 3);
        assert!(job.tracking.step_length.is_none());
        assert_eq!(job.particle.len(), 2);
        assert_eq!(job.particle[0].direction, [0.0, 0.0, 1.0]);
        assert_eq!(job.particle[1].charge, -1.0);
        assert!(job.output.save_csv);
    }

    #[test]
    fn test_fieldmap_job_parses() {
        let job: JobConfig = toml::from_str(
            r#"
            [element]
            type = "fieldmap"
            length = 0.5

            [element.fieldmap]
            file = "solenoid.dat"
            dimension = "z"
            kind = "electric"
            inversions = [false, false, true]

            [element.placement]
            upstream = 2.0
            entry = { translation = [0.001, 0.0, -0.25] }

            [probe]
            start = [0.0, 0.0, -0.25]
            end = [0.0, 0.0, 0.25]
            points = 11
            "#,
        )
        .unwrap();
        let map = job.element.fieldmap.as_ref().unwrap();
        assert_eq!(map.kind, FieldKind::Electric);
        assert_eq!(map.dimension, MapDimension::Z);
        assert!(map.parity.is_none());
        assert_eq!(map.inversions, [false, false, true]);
        assert_eq!(job.element.placement.upstream, 2.0);
        assert_eq!(job.element.placement.entry.as_ref().unwrap().rotation, [0.0; 3]);
        assert_eq!(job.probe.as_ref().unwrap().points, 11);
    }
}
