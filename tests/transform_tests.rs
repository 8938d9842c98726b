use glam::{DMat3, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use viewbox_pipeline::error::ViewError;
use viewbox_pipeline::transform::{Transform2D, Transform3D, TransformStack};

fn assert_close(a: DVec2, b: DVec2, tol: f64) {
    let scale = 1.0_f64.max(a.abs().max_element()).max(b.abs().max_element());
    assert!(
        (a - b).abs().max_element() <= tol * scale,
        "{a:?} != {b:?} (tol {tol})"
    );
}

fn random_transform(rng: &mut StdRng) -> Transform2D {
    let scale = Transform2D::from_scale(rng.random_range(0.01..100.0), rng.random_range(-100.0..-0.01));
    let rotation = Transform2D::from_rotation_deg(rng.random_range(-180.0..180.0));
    let shear = Transform2D::from_shear(rng.random_range(-0.5..0.5), rng.random_range(-0.5..0.5));
    let translation = Transform2D::from_translation(rng.random_range(-1e4..1e4), rng.random_range(-1e4..1e4));
    translation * rotation * shear * scale
}

#[test]
fn test_inverse_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let t = random_transform(&mut rng);
        assert!(!t.is_degenerate());
        let p = DVec2::new(rng.random_range(-1e3..1e3), rng.random_range(-1e3..1e3));
        let back = t.map_inverse(t.map_forward(p)).unwrap();
        assert_close(back, p, 1e-7);
    }
}

#[test]
fn test_large_offset_view_transform_is_invertible() {
    // Timestamps in seconds mapped onto a 1000 px wide view.
    let x0 = 1.7e9;
    let t = Transform2D::from_scale_translation(1000.0 / 3600.0, -2.0, -x0 * 1000.0 / 3600.0, 400.0);
    assert!(!t.is_degenerate());
    let p = DVec2::new(x0 + 1800.0, 12.5);
    let screen = t.map_forward(p);
    assert!((screen.x - 500.0).abs() < 1e-3);
    let back = t.map_inverse(screen).unwrap();
    assert!((back.x - p.x).abs() < 1e-3);
    assert!((back.y - p.y).abs() < 1e-9);
}

#[test]
fn test_singular_transform() {
    let t = Transform2D::from_scale(0.0, 3.0);
    assert!(t.is_degenerate());
    match t.map_inverse(DVec2::new(1.0, 1.0)) {
        Err(ViewError::SingularTransform { determinant }) => assert_eq!(determinant, 0.0),
        other => panic!("expected singular transform, got {other:?}"),
    }
    assert!(t.inverse().is_err());

    // Collinear columns.
    let t = Transform2D::from_matrix(DMat3::from_cols(
        DVec3::new(1.0, 2.0, 0.0),
        DVec3::new(2.0, 4.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    ));
    assert!(t.is_degenerate());
}

#[test]
fn test_compose_applies_child_first() {
    let parent = Transform2D::from_translation(10.0, 0.0);
    let child = Transform2D::from_scale(2.0, 2.0);
    let composed = Transform2D::compose(&parent, &child);
    assert_eq!(composed.map_forward(DVec2::new(1.0, 1.0)), DVec2::new(12.0, 2.0));

    let chained = child.then(&parent);
    assert_eq!(chained.map_forward(DVec2::new(1.0, 1.0)), DVec2::new(12.0, 2.0));
}

#[test]
fn test_compose_is_associative() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let a = random_transform(&mut rng);
        let b = random_transform(&mut rng);
        let c = random_transform(&mut rng);
        let left = (a * b) * c;
        let right = a * (b * c);
        let p = DVec2::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
        assert_close(left.map_forward(p), right.map_forward(p), 1e-9);
    }
}

#[test]
fn test_rotation_degrees() {
    let t = Transform2D::from_rotation_deg(90.0);
    assert_close(t.map_forward(DVec2::new(1.0, 0.0)), DVec2::new(0.0, 1.0), 1e-12);
    assert_close(t.map_vector(DVec2::new(0.0, 2.0)), DVec2::new(-2.0, 0.0), 1e-12);
}

#[test]
fn test_map_rect_bounds() {
    let t = Transform2D::from_rotation_deg(45.0);
    let (lo, hi) = t.map_rect(DVec2::new(-1.0, -1.0), DVec2::new(1.0, 1.0));
    let r = 2.0_f64.sqrt();
    assert_close(lo, DVec2::new(-r, -r), 1e-12);
    assert_close(hi, DVec2::new(r, r), 1e-12);
}

#[test]
fn test_coefficients_round_trip() {
    let t = Transform2D::from_scale_translation(2.0, -3.0, 5.0, 7.0);
    let c = t.to_coefficients();
    assert_eq!(c, [2.0, 0.0, 0.0, 0.0, -3.0, 0.0, 5.0, 7.0, 1.0]);
    assert_eq!(Transform2D::from_coefficients(&c), t);
}

#[test]
fn test_stack_accumulates_without_drift() {
    let base = Transform2D::from_scale_translation(100.0, -100.0, 320.0, 240.0);
    let mut stack = TransformStack::new(&base, 64).unwrap();
    let step = Transform2D::from_rotation_deg(0.7) * Transform2D::from_scale(1.001, 0.999);
    for _ in 0..10_000 {
        stack.push(&step).unwrap();
    }
    assert_eq!(stack.compositions(), 10_000);

    let current = stack.current();
    let m = current.matrix();
    assert_eq!(m.x_axis.z, 0.0);
    assert_eq!(m.y_axis.z, 0.0);
    assert_eq!(m.z_axis.z, 1.0);

    let p = DVec2::new(0.3, -0.2);
    let back = current.map_inverse(current.map_forward(p)).unwrap();
    assert_close(back, p, 1e-6);
}

#[test]
fn test_stack_refuses_degenerate_child() {
    let mut stack = TransformStack::new(&Transform2D::from_scale(2.0, 2.0), 8).unwrap();
    let before = stack.current();
    assert!(stack.push(&Transform2D::from_scale(1.0, 0.0)).is_err());
    assert_eq!(stack.compositions(), 0);
    assert_eq!(stack.current(), before);
}

#[test]
fn test_renormalize_resets_projective_row() {
    let mut m = DMat3::from_scale(DVec2::new(2.0, 2.0));
    m.x_axis.z = 1e-14;
    m.y_axis.z = -1e-14;
    m.z_axis.z = 1.0 + 1e-14;
    let mut stack = TransformStack::new(&Transform2D::from_matrix(m), 64).unwrap();
    stack.renormalize().unwrap();
    let r = stack.current().matrix();
    assert_eq!((r.x_axis.z, r.y_axis.z, r.z_axis.z), (0.0, 0.0, 1.0));
}

#[test]
fn test_transform3d_perspective_round_trip() {
    let view = Transform3D::look_at(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y);
    let proj = Transform3D::perspective(60.0, 1.5, 0.1, 100.0);
    let t = Transform3D::compose(&proj, &view);
    assert!(!t.is_degenerate());

    let p = DVec3::new(0.5, -0.25, 1.0);
    let ndc = t.map_forward(p);
    assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
    let back = t.map_inverse(ndc).unwrap();
    assert!((back - p).abs().max_element() < 1e-6);
}

#[test]
fn test_transform3d_orthographic_and_axis_angle() {
    let ortho = Transform3D::orthographic(0.0, 10.0, 0.0, 5.0, -1.0, 1.0);
    let ndc = ortho.map_forward(DVec3::new(10.0, 5.0, 0.0));
    assert!((ndc.x - 1.0).abs() < 1e-12);
    assert!((ndc.y - 1.0).abs() < 1e-12);

    let rot = Transform3D::from_axis_angle_deg(DVec3::Z, 90.0);
    let r = rot.map_forward(DVec3::X);
    assert!((r - DVec3::Y).abs().max_element() < 1e-12);

    let flat = Transform3D::from_scale(DVec3::new(1.0, 1.0, 0.0));
    assert!(flat.is_degenerate());
    assert!(flat.map_inverse(DVec3::ONE).is_err());
}
