//! Job runner: builds the element, probes its field and tracks particles.

use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::{Rotation3, Vector3};
use rayon::prelude::*;
use serde::Serialize;

use beamline_core::fields::{
    BendField, CircularTmField, ElementField, FieldKind, FieldSource, MappedField, UndulatorField,
};
use beamline_core::integrator::{DriftIntegrator, Integrator, ThinMatrixIntegrator, TransferMatrix};
use beamline_core::{FieldValue, PhaseSpace};
use beamline_fieldmaps::{load_field_map, FieldMap, MapDimension, MirrorParity};
use beamline_geometry::{AttachmentFrame, AttachmentFrames, BeamlinePlacement, CoordinateTransform};

use crate::config::{AnchorConfig, ElementConfig, FieldMapConfig, JobConfig, ProbeConfig};

/// What the element does to particles and fields.
pub enum ElementModel {
    /// A field source (evaluated in the local frame).
    Field(ElementField),
    /// A thin transfer matrix.
    Matrix(ThinMatrixIntegrator),
    /// Field-free space.
    Drift(DriftIntegrator),
}

/// A built element together with its placement.
pub struct Element {
    pub name: String,
    pub length: f64,
    pub transform: CoordinateTransform,
    /// Path length at the element entrance (m).
    pub s_entry: f64,
    pub model: ElementModel,
}

impl Element {
    pub fn type_name(&self) -> &'static str {
        match &self.model {
            ElementModel::Field(field) => field.type_name(),
            ElementModel::Matrix(_) => "rmatrix",
            ElementModel::Drift(_) => "drift",
        }
    }

    /// The stepper used for tracking, if this element has one.
    pub fn integrator(&self) -> Option<&dyn Integrator> {
        match &self.model {
            ElementModel::Matrix(m) => Some(m),
            ElementModel::Drift(d) => Some(d),
            ElementModel::Field(_) => None,
        }
    }
}

/// One probe sample.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSample {
    /// Local position (m).
    pub position: [f64; 3],
    pub time: f64,
    pub field: FieldValue,
}

/// One tracked state.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPoint {
    pub particle: usize,
    pub step: usize,
    pub state: PhaseSpace,
}

/// Cavity figures of merit.
#[derive(Debug, Clone, Serialize)]
pub struct CavityReport {
    pub frequency: f64,
    pub angular_frequency: f64,
    pub voltage: f64,
    /// `(beta, transit-time factor)` pairs.
    pub transit_time_factors: Vec<(f64, f64)>,
}

/// Build and place the element described by a job.
pub fn build_element(job: &JobConfig) -> Result<Element> {
    let cfg = &job.element;
    if !(cfg.length.is_finite() && cfg.length >= 0.0) {
        anyhow::bail!("Element '{}': length must be non-negative, got {}", cfg.name, cfg.length);
    }

    let mut layout = BeamlinePlacement::new();
    if cfg.placement.upstream > 0.0 {
        layout
            .place(cfg.placement.upstream, &AttachmentFrames::nominal())
            .context("Invalid upstream drift length")?;
    }
    let s_entry = layout.s();
    let anchors = AttachmentFrames {
        entry: cfg.placement.entry.as_ref().map(anchor_frame),
        exit: cfg.placement.exit.as_ref().map(anchor_frame),
    };
    let transform = layout
        .place(cfg.length, &anchors)
        .with_context(|| format!("Element '{}': placement failed", cfg.name))?;

    let model = build_model(cfg, transform)?;
    let element = Element {
        name: cfg.name.clone(),
        length: cfg.length,
        transform,
        s_entry,
        model,
    };
    log::info!(
        "Built {} element '{}' (L = {} m) at s = {} m",
        element.type_name(),
        element.name,
        element.length,
        element.s_entry
    );
    Ok(element)
}

fn build_model(cfg: &ElementConfig, transform: CoordinateTransform) -> Result<ElementModel> {
    let context = || format!("Element '{}'", cfg.name);
    let model = match cfg.element_type.as_str() {
        "cavity" => ElementModel::Field(
            CircularTmField::from_strength(&cfg.strength)
                .with_context(context)?
                .into(),
        ),
        "bend" => ElementModel::Field(
            BendField::new(&cfg.strength, cfg.direction)
                .with_context(context)?
                .into(),
        ),
        "undulator" => ElementModel::Field(
            UndulatorField::new(&cfg.strength)
                .with_context(context)?
                .into(),
        ),
        "fieldmap" => {
            let map_cfg = cfg
                .fieldmap
                .as_ref()
                .with_context(|| format!("Element '{}': fieldmap requires an [element.fieldmap] table", cfg.name))?;
            ElementModel::Field(build_mapped_field(map_cfg)?.into())
        }
        "rmatrix" => {
            let matrix = TransferMatrix::from_strength(&cfg.strength, cfg.length, cfg.maximum_radius)
                .with_context(context)?
                .with_length_unit(cfg.length_unit);
            ElementModel::Matrix(ThinMatrixIntegrator::new(matrix, transform))
        }
        "drift" => ElementModel::Drift(DriftIntegrator),
        other => anyhow::bail!(
            "Unsupported element type '{}' for element '{}'. Valid types: cavity, bend, undulator, fieldmap, rmatrix, drift",
            other,
            cfg.name
        ),
    };
    Ok(model)
}

fn build_mapped_field(cfg: &FieldMapConfig) -> Result<MappedField> {
    let path = Path::new(&cfg.file);
    let map = load_field_map(path, cfg.dimension)
        .with_context(|| format!("Failed to load field map '{}'", path.display()))?;
    let parity = cfg.parity.unwrap_or(match cfg.kind {
        FieldKind::Magnetic => MirrorParity::Pseudovector,
        FieldKind::Electric => MirrorParity::Vector,
    });
    let map = match map {
        FieldMap::OneD(m) => {
            let axis = match cfg.dimension {
                MapDimension::X => 0,
                MapDimension::Y => 1,
                MapDimension::Z | MapDimension::T => 2,
            };
            FieldMap::OneD(
                m.with_offset(cfg.offsets[axis])
                    .with_inversion(cfg.inversions[axis]),
            )
        }
        FieldMap::ThreeD(m) => FieldMap::ThreeD(m.with_offsets(cfg.offsets).with_inversions(cfg.inversions)),
    };
    let map = map.with_units(cfg.length_unit, cfg.field_unit).with_parity(parity);
    Ok(MappedField::new(map, cfg.kind))
}

fn anchor_frame(cfg: &AnchorConfig) -> AttachmentFrame {
    let [roll, pitch, yaw] = cfg.rotation;
    AttachmentFrame {
        rotation: Rotation3::from_euler_angles(roll, pitch, yaw),
        translation: Vector3::from(cfg.translation),
    }
}

/// Evaluate the element field along the probe line.
pub fn probe_field(element: &Element, probe: &ProbeConfig) -> Result<Vec<ProbeSample>> {
    let ElementModel::Field(field) = &element.model else {
        anyhow::bail!(
            "Element '{}' of type '{}' has no field to probe",
            element.name,
            element.type_name()
        );
    };
    if probe.points == 0 {
        anyhow::bail!("Probe needs at least one point");
    }

    let samples = (0..probe.points)
        .map(|i| {
            let f = if probe.points > 1 {
                i as f64 / (probe.points - 1) as f64
            } else {
                0.0
            };
            let position = [
                probe.start[0] + f * (probe.end[0] - probe.start[0]),
                probe.start[1] + f * (probe.end[1] - probe.start[1]),
                probe.start[2] + f * (probe.end[2] - probe.start[2]),
            ];
            ProbeSample {
                position,
                time: probe.time,
                field: field.field(&position, probe.time),
            }
        })
        .collect();
    Ok(samples)
}

/// Figures of merit of a cavity element.
pub fn cavity_report(element: &Element, betas: &[f64], steps: usize) -> Result<CavityReport> {
    let ElementModel::Field(ElementField::Cavity(cavity)) = &element.model else {
        anyhow::bail!("Element '{}' is not a cavity", element.name);
    };
    for &beta in betas {
        if !(beta > 0.0 && beta <= 1.0) {
            anyhow::bail!("Relativistic beta must lie in (0, 1], got {}", beta);
        }
    }
    Ok(CavityReport {
        frequency: cavity.frequency(),
        angular_frequency: cavity.angular_frequency(),
        voltage: cavity.voltage_with(steps),
        transit_time_factors: betas
            .iter()
            .map(|&beta| (beta, cavity.transit_time_factor_with(beta, steps)))
            .collect(),
    })
}

/// Track every configured particle through the element, in parallel.
pub fn track_particles(element: &Element, job: &JobConfig) -> Result<Vec<TrackPoint>> {
    let integrator = element.integrator().with_context(|| {
        format!(
            "Element '{}' of type '{}' cannot be tracked; use an rmatrix or drift element",
            element.name,
            element.type_name()
        )
    })?;
    if job.particle.is_empty() {
        anyhow::bail!("No particles configured: add [[particle]] tables");
    }
    let step_length = job.tracking.step_length.unwrap_or(element.length);
    if !(step_length.is_finite() && step_length > 0.0) {
        anyhow::bail!("Step length must be positive, got {}", step_length);
    }
    // A thin element kicks once per crossing; further steps would re-apply it.
    let steps = match &element.model {
        ElementModel::Matrix(_) if job.tracking.steps > 1 => {
            log::warn!(
                "Element '{}' is a thin matrix; tracking 1 step instead of {}",
                element.name,
                job.tracking.steps
            );
            1
        }
        _ => job.tracking.steps,
    };

    println!(
        "Tracking {} particles: {} step(s) of {} m with {}",
        job.particle.len(),
        steps,
        step_length,
        integrator.method_name()
    );

    let tracks: Vec<Vec<TrackPoint>> = job
        .particle
        .par_iter()
        .enumerate()
        .map(|(index, p)| {
            let mut state = PhaseSpace::new(p.position, p.direction, p.momentum, p.time);
            let mut track = Vec::with_capacity(steps + 1);
            track.push(TrackPoint {
                particle: index,
                step: 0,
                state,
            });
            for step in 1..=steps {
                state = integrator.step(&state, p.charge, step_length).state;
                track.push(TrackPoint {
                    particle: index,
                    step,
                    state,
                });
            }
            track
        })
        .collect();

    Ok(tracks.into_iter().flatten().collect())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write probe samples to a CSV file with a metadata header.
pub fn write_probe_csv(samples: &[ProbeSample], path: &Path, element: &Element) -> Result<()> {
    use std::io::Write;

    create_parent(path)?;
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "# Beamline field probe")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        file,
        "# element '{}': type={}, length={} m",
        element.name,
        element.type_name(),
        element.length
    )?;
    writeln!(file, "#")?;
    writeln!(file, "x_m,y_m,z_m,t_s,bx_T,by_T,bz_T,ex_V_per_m,ey_V_per_m,ez_V_per_m")?;

    for s in samples {
        writeln!(
            file,
            "{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e}",
            s.position[0],
            s.position[1],
            s.position[2],
            s.time,
            s.field.b[0],
            s.field.b[1],
            s.field.b[2],
            s.field.e[0],
            s.field.e[1],
            s.field.e[2],
        )?;
    }

    println!("Probe written to: {}", path.display());
    Ok(())
}

/// Write tracked states to a CSV file with a metadata header.
pub fn write_tracks_csv(points: &[TrackPoint], path: &Path, element: &Element) -> Result<()> {
    use std::io::Write;

    create_parent(path)?;
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "# Beamline tracking output (global frame)")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        file,
        "# element '{}': type={}, length={} m, s_entry={} m",
        element.name,
        element.type_name(),
        element.length,
        element.s_entry
    )?;
    let axis = element.transform.beam_axis();
    let centre = element.transform.translation;
    writeln!(
        file,
        "# centre=({:.6}, {:.6}, {:.6}) m, axis=({:.6}, {:.6}, {:.6})",
        centre.x, centre.y, centre.z, axis[0], axis[1], axis[2]
    )?;
    writeln!(file, "#")?;
    writeln!(file, "particle,step,x_m,y_m,z_m,dx,dy,dz,momentum,t_s")?;

    for p in points {
        let s = &p.state;
        writeln!(
            file,
            "{},{},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e}",
            p.particle,
            p.step,
            s.position[0],
            s.position[1],
            s.position[2],
            s.direction[0],
            s.direction[1],
            s.direction[2],
            s.momentum,
            s.time,
        )?;
    }

    println!("Tracks written to: {}", path.display());
    Ok(())
}

/// Write any serialisable result to a JSON file.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("JSON written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(toml_text: &str) -> JobConfig {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn test_thin_lens_tracking() {
        let job = job(
            r#"
            [element]
            type = "rmatrix"
            length = 0.1
            strength = { rmat21 = -2.0 }

            [element.placement]
            upstream = 1.0

            [[particle]]
            position = [0.001, 0.0, 1.0]
            momentum = 1.0

            [[particle]]
            position = [0.001, 0.0, 1.0]
            momentum = 1.0
            charge = 0.0
            "#,
        );
        let element = build_element(&job).unwrap();
        assert_eq!(element.s_entry, 1.0);
        let points = track_particles(&element, &job).unwrap();
        assert_eq!(points.len(), 4);

        let charged = &points[1];
        assert_eq!((charged.particle, charged.step), (0, 1));
        assert!((charged.state.direction[0] + 0.002).abs() < 1e-12);
        assert!((charged.state.position[2] - 1.1).abs() < 1e-12);

        let neutral = &points[3];
        assert_eq!(neutral.particle, 1);
        assert_eq!(neutral.state.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_thin_matrix_tracked_for_one_step_only() {
        let job = job(
            r#"
            [element]
            type = "rmatrix"
            length = 0.1
            strength = { kick2 = 1e-3 }

            [tracking]
            steps = 4

            [[particle]]
            position = [0.0, 0.0, -0.05]
            momentum = 1.0
            "#,
        );
        let element = build_element(&job).unwrap();
        let points = track_particles(&element, &job).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[1].state.direction[0] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_drift_element_tracks_every_step() {
        let job = job(
            r#"
            [element]
            type = "drift"
            length = 0.5

            [tracking]
            steps = 3

            [[particle]]
            position = [0.0, 0.0, 0.0]
            momentum = 1.0
            "#,
        );
        let element = build_element(&job).unwrap();
        let points = track_particles(&element, &job).unwrap();
        assert_eq!(points.len(), 4);
        assert!((points[3].state.position[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_probe_cavity_axis() {
        let job = job(
            r#"
            [element]
            type = "cavity"
            length = 0.2
            strength = { efield = 1e6, cavity_radius = 0.1, cavity_length = 0.2, cavity_m = 0, cavity_n = 1 }

            [probe]
            start = [0.0, 0.0, -0.1]
            end = [0.0, 0.0, 0.1]
            points = 5
            "#,
        );
        let element = build_element(&job).unwrap();
        let samples = probe_field(&element, job.probe.as_ref().unwrap()).unwrap();
        assert_eq!(samples.len(), 5);
        for s in &samples {
            assert!((s.field.e[2] - 1e6).abs() < 1e-3);
        }
        assert!((samples[2].position[2]).abs() < 1e-15);

        let report = cavity_report(&element, &[1.0], 200).unwrap();
        assert!((report.voltage - 2e5).abs() < 1e-6);
        assert!(track_particles(&element, &job).is_err());
    }

    #[test]
    fn test_unknown_element_type_rejected() {
        let job = job(
            r#"
            [element]
            type = "wiggler"
            length = 1.0
            "#,
        );
        let err = build_element(&job).err().unwrap();
        assert!(err.to_string().contains("Unsupported element type"));
    }

    #[test]
    fn test_missing_strength_reported() {
        let job = job(
            r#"
            [element]
            type = "undulator"
            length = 1.0
            strength = { field = 1.0 }
            "#,
        );
        let err = build_element(&job).err().unwrap();
        assert!(format!("{:#}", err).contains("length"));
    }
}
