use std::time::Duration;

use viewbox_pipeline::config::{DecimationConfig, PipelineConfig};
use viewbox_pipeline::view_range::{AxisRange, ViewRange};

#[test]
fn test_default_config_round_trips() {
    let config = PipelineConfig::default();
    let json = config.to_json().unwrap();
    assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let json = r#"{
        "decimation": { "occupancy_threshold": 8, "dynamic_range_limit": null },
        "range": { "default_range": { "x": { "min": -1.0, "max": 1.0 }, "y": { "min": 0.0, "max": 5.0 } } },
        "zoom_sensitivity": 240.0
    }"#;
    let config = PipelineConfig::from_json(json).unwrap();
    assert_eq!(config.decimation.occupancy_threshold, 8);
    assert_eq!(config.decimation.dynamic_range_limit, None);
    assert_eq!(
        config.decimation.background_threshold,
        DecimationConfig::default().background_threshold
    );
    assert_eq!(config.range.default_range, ViewRange::new(-1.0, 1.0, 0.0, 5.0));
    assert_eq!(config.range.default_padding, 0.02);
    assert_eq!(config.zoom_sensitivity, 240.0);
    assert_eq!(config.inertia.stop_threshold, Duration::from_millis(150));
    assert_eq!(config.renormalize_interval, 64);
}

#[test]
fn test_malformed_config_is_an_error() {
    assert!(PipelineConfig::from_json("{ not json").is_err());
    assert!(PipelineConfig::from_json(r#"{ "renormalize_interval": "often" }"#).is_err());
}

#[test]
fn test_downsample_factor_uses_configured_density() {
    let x: Vec<f64> = (0..10_001).map(|i| i as f64).collect();
    let config = DecimationConfig {
        auto_downsample_factor: 2.0,
        ..DecimationConfig::default()
    };
    assert_eq!(config.downsample_factor(&x, &AxisRange::new(0.0, 10_000.0), 500.0), 10);
    assert_eq!(config.downsample_factor(&x, &AxisRange::new(0.0, 10.0), 500.0), 1);
}
