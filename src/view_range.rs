use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewError};

/// Smallest span a navigation step may produce.
pub const MIN_SPAN: f64 = 1e-9;

/// Relative half-width used to widen a zero-width range around its value.
pub const ZERO_SPAN_RELATIVE_PAD: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// Visible (min, max) on one axis, in data coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Validates a requested range. Non-finite or inverted bounds are rejected;
    /// a zero-width range is widened by a tiny epsilon around its value.
    pub fn try_new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ViewError::InvalidRange {
                min,
                max,
                reason: "non-finite bound",
            });
        }
        if min > max {
            return Err(ViewError::InvalidRange {
                min,
                max,
                reason: "inverted bounds",
            });
        }
        if min == max {
            let pad = (min.abs() * ZERO_SPAN_RELATIVE_PAD).max(MIN_SPAN / 2.0);
            return Ok(Self::new(min - pad, max + pad));
        }
        Ok(Self::new(min, max))
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Position of `value` as a fraction of the range (0 at min, 1 at max).
    pub fn fraction_of(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    pub fn pan(&mut self, delta: f64) {
        self.min += delta;
        self.max += delta;
    }

    /// Magnifies by `factor` keeping `anchor` at the same fraction of the range.
    pub fn zoom_at(&mut self, anchor: f64, factor: f64) {
        let lo = anchor - self.min;
        let hi = self.max - anchor;
        self.min = anchor - lo / factor;
        self.max = anchor + hi / factor;
    }

    pub fn union(&self, other: &AxisRange) -> AxisRange {
        AxisRange::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Pads by `fraction` of the span on each side, or by `min_abs` when the span is zero.
    pub fn padded(&self, fraction: f64, min_abs: f64) -> AxisRange {
        let span = self.span();
        let pad = if span.abs() < f64::EPSILON * self.min.abs().max(1.0) {
            min_abs
        } else {
            span * fraction
        };
        AxisRange::new(self.min - pad, self.max + pad)
    }
}

/// Navigation constraints for one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub min_limit: Option<f64>,
    pub max_limit: Option<f64>,
    pub min_span: Option<f64>,
    pub max_span: Option<f64>,
}

impl AxisLimits {
    /// Fills absent position limits from `bounds`.
    pub fn within(&self, bounds: AxisRange) -> AxisLimits {
        AxisLimits {
            min_limit: Some(self.min_limit.unwrap_or(bounds.min)),
            max_limit: Some(self.max_limit.unwrap_or(bounds.max)),
            ..*self
        }
    }

    /// Largest span the position limits allow.
    fn limit_span(&self) -> Option<f64> {
        match (self.min_limit, self.max_limit) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        }
    }

    /// Span bounds after combining explicit span limits with the position limits.
    pub fn span_bounds(&self) -> (f64, f64) {
        let lo = self.min_span.unwrap_or(MIN_SPAN).max(MIN_SPAN);
        let mut hi = self.max_span.unwrap_or(f64::INFINITY);
        if let Some(s) = self.limit_span() {
            hi = hi.min(s);
        }
        (lo, hi.max(lo))
    }

    /// Applies span limits around the centre, then shifts the range inside the
    /// position limits without changing its span.
    pub fn clamp(&self, range: AxisRange) -> AxisRange {
        let mut r = range;
        let (min_span, max_span) = self.span_bounds();
        let span = r.span();
        if span < min_span || span > max_span {
            let c = r.center();
            let s = span.clamp(min_span, max_span);
            r = AxisRange::new(c - s / 2.0, c + s / 2.0);
        }

        let (Some(min_l), Some(max_l)) = (self.min_limit, self.max_limit) else {
            if let Some(l) = self.min_limit {
                if r.min < l {
                    let s = r.span();
                    r.min = l;
                    r.max = l + s;
                }
            }
            if let Some(l) = self.max_limit {
                if r.max > l {
                    let s = r.span();
                    r.max = l;
                    r.min = l - s;
                }
            }
            return r;
        };

        let current_span = r.span();
        if current_span <= max_l - min_l {
            if r.min < min_l {
                r.min = min_l;
                r.max = min_l + current_span;
            } else if r.max > max_l {
                r.max = max_l;
                r.min = max_l - current_span;
            }
        } else {
            r.min = min_l;
            r.max = max_l;
        }
        r
    }
}

/// Visible data rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRange {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl ViewRange {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x: AxisRange::new(x_min, x_max),
            y: AxisRange::new(y_min, y_max),
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisRange {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisRange {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    pub fn width(&self) -> f64 {
        self.x.span()
    }

    pub fn height(&self) -> f64 {
        self.y.span()
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_valid() && self.y.is_valid()
    }

    pub fn union(&self, other: &ViewRange) -> ViewRange {
        ViewRange {
            x: self.x.union(&other.x),
            y: self.y.union(&other.y),
        }
    }
}

/// Device-space rectangle the view range is mapped onto, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 640.0, 480.0)
    }
}

impl Viewport {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Whole pixel columns covered by the viewport (at least one).
    pub fn pixel_columns(&self) -> usize {
        if self.width.is_finite() && self.width >= 1.0 {
            self.width.round() as usize
        } else {
            1
        }
    }
}
