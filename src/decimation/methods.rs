//! Fixed-factor downsampling and clip-to-view, applied before display.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::common::find_extrema_indices_f64;
use crate::config::DecimationConfig;
use crate::data_types::DataSeries;
use crate::view_range::AxisRange;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownsampleMethod {
    /// Every n-th sample.
    Subsample,
    /// Mean of each run of n samples.
    Mean,
    /// Max then min of each run of n samples, drawn as a saw wave.
    #[default]
    Peak,
}

/// Display-time reduction an item asks for on top of peak decimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionOptions {
    /// Fixed downsample factor; 1 keeps every sample.
    pub factor: usize,
    /// Derive the factor from the visible sample density instead.
    pub auto: bool,
    pub method: DownsampleMethod,
    /// Drop samples outside the visible x range (sorted x only).
    pub clip_to_view: bool,
}

impl Default for ReductionOptions {
    fn default() -> Self {
        Self {
            factor: 1,
            auto: false,
            method: DownsampleMethod::Peak,
            clip_to_view: false,
        }
    }
}

impl ReductionOptions {
    pub fn is_active(&self) -> bool {
        self.factor > 1 || self.auto || self.clip_to_view
    }
}

/// Applies `options` to a series for display in `view_x` over `width_px`
/// pixels. The factor is chosen first, then the series is clipped (keeping
/// `factor` samples beyond each edge), then downsampled.
pub fn reduce_for_display(
    series: &DataSeries,
    view_x: &AxisRange,
    width_px: f64,
    options: &ReductionOptions,
    config: &DecimationConfig,
) -> DataSeries {
    let (x, y) = (series.x(), series.y());
    let factor = if options.auto {
        config.downsample_factor(x, view_x, width_px)
    } else {
        options.factor.max(1)
    };
    let window = if options.clip_to_view && series.visible_indices(view_x.min, view_x.max).is_some() {
        clip_to_view(x, view_x, factor)
    } else {
        0..x.len()
    };
    let reduced = downsample(&x[window.clone()], &y[window], factor, options.method);
    DataSeries::new(reduced.x, reduced.y)
}

/// Output of [`downsample`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Downsampled {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Downsample factor giving roughly `samples_per_px` samples per pixel,
/// assuming evenly spaced x. Returns 1 when nothing can be inferred.
pub fn auto_factor(x: &[f64], view_x: &AxisRange, width_px: f64, samples_per_px: f64) -> usize {
    let n = x.len();
    if n < 2 || width_px <= 0.0 || samples_per_px <= 0.0 {
        return 1;
    }
    let dx = (x[n - 1] - x[0]) / (n - 1) as f64;
    if dx == 0.0 || !dx.is_finite() {
        return 1;
    }
    let visible_samples = view_x.span() / dx;
    let ds = visible_samples / (width_px * samples_per_px);
    if ds.is_finite() && ds > 1.0 {
        ds as usize
    } else {
        1
    }
}

/// Index window covering the samples inside `view_x` plus `extend` samples
/// on each side, so a line still reaches the view edges. Requires x sorted
/// ascending.
pub fn clip_to_view(x: &[f64], view_x: &AxisRange, extend: usize) -> Range<usize> {
    let n = x.len();
    let start = x.partition_point(|&v| v < view_x.min).saturating_sub(extend);
    let end = (x.partition_point(|&v| v < view_x.max) + extend).clamp(start, n);
    start..end
}

/// Reduces the series by `factor`. A trailing partial run is dropped by the
/// averaging methods.
pub fn downsample(x: &[f64], y: &[f64], factor: usize, method: DownsampleMethod) -> Downsampled {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    if factor <= 1 {
        return Downsampled {
            x: x.to_vec(),
            y: y.to_vec(),
        };
    }

    match method {
        DownsampleMethod::Subsample => Downsampled {
            x: x.iter().step_by(factor).copied().collect(),
            y: y.iter().step_by(factor).copied().collect(),
        },
        DownsampleMethod::Mean => {
            let centre = factor / 2;
            let runs = n / factor;
            Downsampled {
                x: (0..runs).map(|i| x[i * factor + centre]).collect(),
                y: y.chunks_exact(factor)
                    .map(|run| run.iter().sum::<f64>() / factor as f64)
                    .collect(),
            }
        }
        DownsampleMethod::Peak => {
            let centre = factor / 2;
            let runs = n / factor;
            let mut out = Downsampled {
                x: Vec::with_capacity(runs * 2),
                y: Vec::with_capacity(runs * 2),
            };
            for (i, run) in y.chunks_exact(factor).enumerate() {
                let xc = x[i * factor + centre];
                let (lo, hi) = run_extrema(run);
                out.x.extend_from_slice(&[xc, xc]);
                out.y.extend_from_slice(&[hi, lo]);
            }
            out
        }
    }
}

/// Min and max of a run; NaN if the run contains NaN.
fn run_extrema(run: &[f64]) -> (f64, f64) {
    if run.iter().any(|v| v.is_nan()) {
        return (f64::NAN, f64::NAN);
    }
    match find_extrema_indices_f64(run) {
        Some((lo, hi)) => (run[lo], run[hi]),
        None => (f64::NAN, f64::NAN),
    }
}
