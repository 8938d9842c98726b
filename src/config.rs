//! Tuning constants of the pipeline.
//!
//! Every threshold the decimation, auto-range and render stages use lives here
//! so an embedding application can override it (or load it from JSON) instead
//! of relying on hidden behavior.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::decimation::auto_factor;
use crate::view_range::{AxisRange, ViewRange};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertiaConfig {
    pub enabled: bool,
    pub friction: f64,
    pub sensitivity: f64,
    pub stop_threshold: std::time::Duration,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            friction: 0.80,
            sensitivity: 1.0,
            stop_threshold: std::time::Duration::from_millis(150),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimationConfig {
    /// Buckets holding more samples than this emit min/max instead of raw samples.
    pub occupancy_threshold: usize,
    /// Samples drawn per pixel when the downsample factor is chosen automatically.
    pub auto_downsample_factor: f64,
    /// Series longer than this are handed to the background worker when static.
    pub background_threshold: usize,
    /// Clip y to `view ± limit * view height`; `None` disables clipping.
    pub dynamic_range_limit: Option<f64>,
    pub dynamic_range_hysteresis: f64,
    /// Edge of the square device cell that holds at most one scatter symbol.
    pub scatter_cell_px: f64,
}

impl Default for DecimationConfig {
    fn default() -> Self {
        Self {
            occupancy_threshold: 2,
            auto_downsample_factor: 5.0,
            background_threshold: 2_000_000,
            dynamic_range_limit: Some(1e6),
            dynamic_range_hysteresis: 3.0,
            scatter_cell_px: 1.0,
        }
    }
}

impl DecimationConfig {
    /// Fixed downsample factor for `x` shown in `view_x` across `width_px`,
    /// at `auto_downsample_factor` samples per pixel.
    pub fn downsample_factor(&self, x: &[f64], view_x: &AxisRange, width_px: f64) -> usize {
        auto_factor(x, view_x, width_px, self.auto_downsample_factor)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Polylines with more vertices than this are simplified before emission.
    pub simplify_threshold: usize,
    /// Maximum perpendicular deviation, in pixels, of a removed vertex.
    pub simplify_tolerance: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            simplify_threshold: 2048,
            simplify_tolerance: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// Padding as a fraction of the data span, applied on each side.
    pub default_padding: f64,
    /// Absolute padding used when the data span is zero.
    pub min_padding: f64,
    /// Used when no item reports finite bounds.
    pub default_range: ViewRange,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            default_padding: 0.02,
            min_padding: 0.5,
            default_range: ViewRange::new(0.0, 1.0, 0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub decimation: DecimationConfig,
    pub render: RenderConfig,
    pub range: RangeConfig,
    pub inertia: InertiaConfig,
    /// Accumulated transforms are renormalized after this many compositions.
    pub renormalize_interval: u32,
    /// Wheel delta, in pixels, that adds 1.0 to the zoom factor.
    pub zoom_sensitivity: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decimation: DecimationConfig::default(),
            render: RenderConfig::default(),
            range: RangeConfig::default(),
            inertia: InertiaConfig::default(),
            renormalize_interval: 64,
            zoom_sensitivity: 100.0,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("failed to parse pipeline config")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize pipeline config")
    }
}
