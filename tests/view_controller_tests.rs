use viewbox_pipeline::view_controller::ViewController;
use viewbox_pipeline::view_range::{AxisLimits, AxisRange};

#[test]
fn test_pan_axis_x() {
    let range = AxisRange::new(0.0, 100.0);
    // 10 px to the right over 100 px: the window moves 10 units left.
    let next = ViewController::pan_axis(&range, 10.0, 100.0, true, &AxisLimits::default());
    assert_eq!(next.min, -10.0);
    assert_eq!(next.max, 90.0);
}

#[test]
fn test_pan_axis_y() {
    let range = AxisRange::new(0.0, 100.0);
    // Dragging down on a y-up axis moves the window up.
    let next = ViewController::pan_axis(&range, 10.0, 100.0, false, &AxisLimits::default());
    assert_eq!(next.min, 10.0);
    assert_eq!(next.max, 110.0);
}

#[test]
fn test_pan_respects_limits() {
    let range = AxisRange::new(0.0, 100.0);
    let limits = AxisLimits {
        min_limit: Some(-5.0),
        ..AxisLimits::default()
    };
    let next = ViewController::pan_axis(&range, 50.0, 100.0, true, &limits);
    assert_eq!(next.min, -5.0);
    assert_eq!(next.max, 95.0);
}

#[test]
fn test_zoom_axis_at() {
    let range = AxisRange::new(0.0, 100.0);
    let next = ViewController::zoom_axis_at(&range, 50.0, 2.0, &AxisLimits::default());
    assert_eq!(next.min, 25.0);
    assert_eq!(next.max, 75.0);
}

#[test]
fn test_zoom_keeps_anchor_fraction() {
    let range = AxisRange::new(-3.0, 17.0);
    let anchor = 2.0;
    let before = range.fraction_of(anchor);
    let next = ViewController::zoom_axis_at(&range, anchor, 3.7, &AxisLimits::default());
    assert!((next.fraction_of(anchor) - before).abs() < 1e-12);
    assert!((next.span() - 20.0 / 3.7).abs() < 1e-12);
}

#[test]
fn test_zoom_limited_by_min_span_keeps_anchor() {
    let range = AxisRange::new(0.0, 100.0);
    let limits = AxisLimits {
        min_span: Some(10.0),
        ..AxisLimits::default()
    };
    let next = ViewController::zoom_axis_at(&range, 20.0, 100.0, &limits);
    assert!((next.span() - 10.0).abs() < 1e-12);
    assert!((next.fraction_of(20.0) - 0.2).abs() < 1e-12);
}

#[test]
fn test_compute_zoom_factor() {
    assert_eq!(ViewController::compute_zoom_factor(100.0, 100.0), 2.0);
    assert_eq!(ViewController::compute_zoom_factor(-100.0, 100.0), 0.5);
    assert_eq!(ViewController::compute_zoom_factor(0.0, 100.0), 1.0);
}

#[test]
fn test_apply_friction() {
    let mut v = 100.0;
    ViewController::apply_friction(&mut v, 0.9, 1.0 / 60.0);
    assert!((v - 90.0).abs() < 1e-9);

    let mut slow = 0.005;
    ViewController::apply_friction(&mut slow, 0.9, 1.0 / 60.0);
    assert_eq!(slow, 0.0);
}

#[test]
fn test_axis_range_try_new() {
    assert!(AxisRange::try_new(f64::NAN, 1.0).is_err());
    assert!(AxisRange::try_new(2.0, 1.0).is_err());
    let widened = AxisRange::try_new(5.0, 5.0).unwrap();
    assert!(widened.is_valid());
    assert!(widened.contains(5.0));
}

#[test]
fn test_limits_clamp_span_and_position() {
    let limits = AxisLimits {
        min_limit: Some(0.0),
        max_limit: Some(50.0),
        min_span: None,
        max_span: Some(20.0),
    };
    let r = limits.clamp(AxisRange::new(40.0, 100.0));
    assert_eq!(r.span(), 20.0);
    assert_eq!(r.max, 50.0);

    let wide = AxisLimits {
        min_limit: Some(0.0),
        max_limit: Some(10.0),
        ..AxisLimits::default()
    };
    let r = wide.clamp(AxisRange::new(-100.0, 100.0));
    assert_eq!((r.min, r.max), (0.0, 10.0));
}
