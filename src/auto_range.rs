//! Range engine: fits the view to the bounds of the visible items.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RangeConfig;
use crate::item::{AxisBounds, ItemSource};
use crate::view_range::{Axis, AxisRange, ViewRange, Viewport};

/// Relative scale mismatch below which an aspect lock is considered satisfied.
const ASPECT_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisAutoRange {
    pub enabled: bool,
    /// Padding fraction of the span; `None` uses the configured default.
    pub padding: Option<f64>,
    /// Y only: fit data lying inside the x range.
    pub visible_only: bool,
}

impl Default for AxisAutoRange {
    fn default() -> Self {
        Self {
            enabled: true,
            padding: None,
            visible_only: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoRangeState {
    pub x: AxisAutoRange,
    pub y: AxisAutoRange,
}

impl AutoRangeState {
    pub fn axis(&self, axis: Axis) -> &AxisAutoRange {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisAutoRange {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.x.enabled || self.y.enabled
    }
}

/// Inputs the fit depends on besides the items themselves.
#[derive(Clone, Copy, Debug)]
pub struct FitContext<'a> {
    pub state: &'a AutoRangeState,
    pub current: &'a ViewRange,
    pub viewport: Option<&'a Viewport>,
    /// Locked ratio of y data-units-per-pixel to x data-units-per-pixel.
    pub aspect: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct RangeEngine {
    config: RangeConfig,
}

impl RangeEngine {
    pub fn new(config: RangeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RangeConfig {
        &self.config
    }

    /// Union of the finite bounds items report on `axis`. Unbounded and
    /// empty axes do not contribute.
    pub fn data_bounds<I: ItemSource>(items: &[I], axis: Axis) -> Option<AxisRange> {
        items
            .iter()
            .filter(|item| item.is_visible())
            .filter_map(|item| item.bounds().axis(axis).finite())
            .reduce(|a, b| a.union(&b))
    }

    /// Union of y bounds restricted to samples with x inside `x_range`.
    pub fn y_bounds_within<I: ItemSource>(items: &[I], x_range: &AxisRange) -> Option<AxisRange> {
        items
            .iter()
            .filter(|item| item.is_visible())
            .filter_map(|item| match item.data() {
                Some(series) => series.y_range_within(x_range.min, x_range.max),
                None => {
                    let b = item.bounds();
                    let overlaps = match b.x {
                        AxisBounds::Finite(r) => r.max >= x_range.min && r.min <= x_range.max,
                        AxisBounds::Unbounded => true,
                        AxisBounds::Empty => false,
                    };
                    if overlaps {
                        b.y.finite()
                    } else {
                        None
                    }
                }
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Computes the fitted view range. Never fails: axes with nothing finite
    /// to fit fall back to the configured default range, disabled axes keep
    /// their current range.
    pub fn fit<I: ItemSource>(&self, items: &[I], ctx: FitContext<'_>) -> ViewRange {
        let mut result = *ctx.current;

        let x = self.fit_axis(items, Axis::X, &ctx, None);
        if let Some(x) = x {
            result.x = x;
        }
        let y = self.fit_axis(items, Axis::Y, &ctx, Some(&result.x));
        if let Some(y) = y {
            result.y = y;
        }

        if let (Some(ratio), Some(viewport)) = (ctx.aspect, ctx.viewport) {
            result = Self::lock_aspect(result, viewport, ratio);
        }

        debug!(
            x_min = result.x.min,
            x_max = result.x.max,
            y_min = result.y.min,
            y_max = result.y.max,
            "auto-range computed"
        );
        result
    }

    fn fit_axis<I: ItemSource>(
        &self,
        items: &[I],
        axis: Axis,
        ctx: &FitContext<'_>,
        x_range: Option<&AxisRange>,
    ) -> Option<AxisRange> {
        let auto = ctx.state.axis(axis);
        if !auto.enabled {
            return None;
        }

        let bounds = match (axis, auto.visible_only, x_range) {
            (Axis::Y, true, Some(xr)) => Self::y_bounds_within(items, xr),
            _ => Self::data_bounds(items, axis),
        };

        let Some(bounds) = bounds else {
            return Some(*self.config.default_range.axis(axis));
        };

        let padding = auto.padding.unwrap_or(self.config.default_padding);
        let mut fitted = bounds.padded(padding, self.config.min_padding);

        if let Some(viewport) = ctx.viewport {
            let px_pad = items
                .iter()
                .filter(|i| i.is_visible())
                .map(|i| i.pixel_padding())
                .fold(0.0_f64, f64::max);
            let extent = viewport.extent(axis);
            if px_pad > 0.0 && extent > 2.0 * px_pad {
                let data_pad = px_pad * fitted.span() / (extent - 2.0 * px_pad);
                fitted = AxisRange::new(fitted.min - data_pad, fitted.max + data_pad);
            }
        }
        Some(fitted)
    }

    /// Widens the axis with the finer scale so that
    /// `y_units_per_px == ratio * x_units_per_px`. Never shrinks a range.
    pub fn lock_aspect(range: ViewRange, viewport: &Viewport, ratio: f64) -> ViewRange {
        if !viewport.is_drawable() || !ratio.is_finite() || ratio <= 0.0 || !range.is_valid() {
            return range;
        }
        let sx = range.width() / viewport.width;
        let sy = range.height() / viewport.height;
        let target_y = ratio * sx;
        let mut out = range;
        if (sy - target_y).abs() <= ASPECT_TOLERANCE * sy.max(target_y) {
            return out;
        }
        if sy < target_y {
            let half = target_y * viewport.height / 2.0;
            let c = range.y.center();
            out.y = AxisRange::new(c - half, c + half);
        } else {
            let half = (sy / ratio) * viewport.width / 2.0;
            let c = range.x.center();
            out.x = AxisRange::new(c - half, c + half);
        }
        out
    }
}
