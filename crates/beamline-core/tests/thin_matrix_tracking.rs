//! Integration test: thin transfer-matrix elements placed on a beamline.
//!
//! Elements are positioned with `BeamlinePlacement`, so these tests cover
//! the local/global conversion on both sides of the matrix as well as the
//! stepping rules.

use approx::assert_abs_diff_eq;
use beamline_core::integrator::{drift, Integrator, ThinMatrixIntegrator, TransferMatrix};
use beamline_core::{ElementStrength, PhaseSpace};
use beamline_geometry::{AttachmentFrames, BeamlinePlacement, CoordinateTransform};
use nalgebra::{Rotation3, Vector3};

#[test]
fn test_phase_space_round_trip_through_transform() {
    let transform = CoordinateTransform::new(
        Rotation3::from_euler_angles(0.1, -0.4, 1.2),
        Vector3::new(1.0, -2.0, 30.0),
    );
    let local = PhaseSpace::new([0.003, -0.001, 0.2], [0.01, 0.02, 1.0], 3.5, 2.0e-9);
    let back = local.to_global(&transform).to_local(&transform);
    for i in 0..3 {
        assert_abs_diff_eq!(back.position[i], local.position[i], epsilon = 1e-12);
        assert_abs_diff_eq!(back.direction[i], local.direction[i], epsilon = 1e-12);
    }
    assert_eq!(back.momentum, local.momentum);
    assert_eq!(back.time, local.time);
}

#[test]
fn test_thin_lens_in_rotated_element() {
    // Second element of a line whose axis has been turned onto global +x.
    let mut layout = BeamlinePlacement::starting_at(
        Vector3::zeros(),
        Rotation3::from_euler_angles(0.0, std::f64::consts::FRAC_PI_2, 0.0),
    );
    layout.place(2.0, &AttachmentFrames::nominal()).unwrap();
    let transform = layout.place(0.1, &AttachmentFrames::nominal()).unwrap();

    let strength = ElementStrength::new().with("rmat21", -1.0 / 0.5).with("rmat43", -1.0 / 0.5);
    let matrix = TransferMatrix::from_strength(&strength, 0.1, 0.05).unwrap();
    let lens = ThinMatrixIntegrator::new(matrix, transform);

    // Particle 1 mm off axis, travelling along the element axis, at the element entrance.
    let entry_local = PhaseSpace::new([0.001, 0.0, -0.05], [0.0, 0.0, 1.0], 1.0, 0.0);
    let entry = entry_local.to_global(&transform);
    let out = lens.step(&entry, 1.0, 0.1);
    let out_local = out.state.to_local(&transform);

    assert_abs_diff_eq!(out_local.position[0], 0.001, epsilon = 1e-12);
    assert_abs_diff_eq!(out_local.position[2], 0.05, epsilon = 1e-12);
    assert_abs_diff_eq!(out_local.direction[0], -0.002, epsilon = 1e-12);
    assert_abs_diff_eq!(out_local.direction[1], 0.0, epsilon = 1e-12);
    let norm: f64 = out.state.direction.iter().map(|d| d * d).sum();
    assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
}

#[test]
fn test_identity_element_behaves_as_drift_off_axis_frame() {
    let transform = CoordinateTransform::new(
        Rotation3::from_euler_angles(0.0, 0.3, 0.0),
        Vector3::new(0.5, 0.0, 4.0),
    );
    let integrator = ThinMatrixIntegrator::new(TransferMatrix::identity(0.2, 1.0).unwrap(), transform);
    let beam_axis = transform.beam_axis();
    let start = PhaseSpace::new(transform.local_to_global_point(&[0.002, 0.001, -0.1]), beam_axis, 1.0, 0.0);
    let result = integrator.step(&start, -1.0, 0.2);
    let expected = drift(&start, 0.2);
    for i in 0..3 {
        assert_abs_diff_eq!(result.state.position[i], expected.state.position[i], epsilon = 1e-12);
        assert_abs_diff_eq!(result.state.direction[i], expected.state.direction[i], epsilon = 1e-12);
    }
}

#[test]
fn test_step_fraction_threshold() {
    let strength = ElementStrength::new().with("kick2", 1.0e-3);
    let matrix = TransferMatrix::from_strength(&strength, 1.0, 1.0).unwrap();
    let integrator = ThinMatrixIntegrator::new(matrix, CoordinateTransform::default());
    let start = PhaseSpace::new([0.0; 3], [0.0, 0.0, 1.0], 1.0, 0.0);

    let short = integrator.step(&start, 1.0, 0.509);
    assert_eq!(short, drift(&start, 0.509));
    let long = integrator.step(&start, 1.0, 0.511);
    assert_abs_diff_eq!(long.state.direction[0], 1.0e-3, epsilon = 1e-15);
    assert_eq!(long.chord_distance, 0.0);
}

#[test]
fn test_integrators_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ThinMatrixIntegrator>();
    let boxed: Vec<Box<dyn Integrator>> = vec![
        Box::new(beamline_core::integrator::DriftIntegrator),
        Box::new(ThinMatrixIntegrator::new(
            TransferMatrix::identity(1.0, 1.0).unwrap(),
            CoordinateTransform::default(),
        )),
    ];
    let names: Vec<&str> = boxed.iter().map(|i| i.method_name()).collect();
    assert_eq!(names, ["drift", "thin transfer matrix"]);
}
