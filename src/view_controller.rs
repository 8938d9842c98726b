use crate::view_range::{AxisLimits, AxisRange};

/// ViewController holds the per-axis navigation math (zoom, pan, inertia)
/// independently of any state machine or windowing infrastructure to
/// facilitate testing.
pub struct ViewController;

impl ViewController {
    /// Pans an axis by a pixel delta so the content follows the pointer.
    ///
    /// `data_grows_with_pixels` is true when increasing device coordinates map
    /// to increasing data values (x normally, y only when inverted).
    pub fn pan_axis(
        range: &AxisRange,
        delta_pixels: f64,
        total_pixels: f64,
        data_grows_with_pixels: bool,
        limits: &AxisLimits,
    ) -> AxisRange {
        if total_pixels <= 0.0 || !delta_pixels.is_finite() {
            return *range;
        }
        let ratio = range.span() / total_pixels;

        // Dragging right by 10px must pull the content right, so the visible
        // window moves left in data space; on a y-up axis dragging down moves
        // the window up.
        let delta_data = if data_grows_with_pixels {
            -delta_pixels * ratio
        } else {
            delta_pixels * ratio
        };

        let mut next = *range;
        next.pan(delta_data);
        limits.clamp(next)
    }

    /// Magnifies an axis by `factor` around `anchor` (data units).
    ///
    /// The factor is reduced, not the anchor moved, when span limits would be
    /// violated, so the anchor keeps its screen position whenever the position
    /// limits do not bind.
    pub fn zoom_axis_at(range: &AxisRange, anchor: f64, factor: f64, limits: &AxisLimits) -> AxisRange {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return *range;
        }
        let span = range.span();
        let (min_span, max_span) = limits.span_bounds();

        let mut new_factor = factor;
        if span / new_factor < min_span {
            new_factor = span / min_span;
        }
        if span / new_factor > max_span {
            new_factor = span / max_span;
        }

        let mut next = *range;
        next.zoom_at(anchor, new_factor);
        limits.clamp(next)
    }

    /// Converts a wheel delta into a magnification factor (> 1 zooms in).
    pub fn compute_zoom_factor(delta: f32, sensitivity: f32) -> f64 {
        let factor = 1.0 + (delta.abs() / sensitivity.max(f32::EPSILON)) as f64;
        if delta > 0.0 {
            factor
        } else {
            1.0 / factor
        }
    }

    /// Decays a velocity with frame-rate independent friction.
    pub fn apply_friction(velocity: &mut f64, friction: f64, dt: f64) {
        *velocity *= friction.powf(dt * 60.0);
        if velocity.abs() < 0.01 {
            *velocity = 0.0;
        }
    }
}
