use tracing::trace;

use crate::view_range::AxisRange;

/// Clamps y values far outside the view so the painter never sees
/// coordinates large enough to lose precision.
///
/// The clip window extends `limit` view heights beyond each edge of the view.
/// It is kept while each edge stays within `[limit / hysteresis, limit *
/// hysteresis]` view heights of the view, so small pans and zooms reuse the
/// previous window.
#[derive(Clone, Debug)]
pub struct DynamicRangeLimiter {
    limit: f64,
    hysteresis: f64,
    last_clip: Option<AxisRange>,
}

impl DynamicRangeLimiter {
    pub fn new(limit: f64, hysteresis: f64) -> Self {
        Self {
            limit,
            hysteresis: hysteresis.max(1.0),
            last_clip: None,
        }
    }

    pub fn last_clip(&self) -> Option<AxisRange> {
        self.last_clip
    }

    /// Returns the window to clip against, or `None` when the data fits
    /// within the extended limit (or lies entirely off-screen).
    pub fn window(&mut self, data_y: &AxisRange, view_y: &AxisRange) -> Option<AxisRange> {
        let vh = view_y.span();
        let fits = data_y.span() <= 2.0 * self.hysteresis * self.limit * vh;
        if !vh.is_finite() || vh <= 0.0 || data_y.max < view_y.min || data_y.min > view_y.max || fits {
            return None;
        }

        if let Some(last) = self.last_clip {
            let below = (view_y.min - last.min) / vh;
            let above = (last.max - view_y.max) / vh;
            let lo = self.limit / self.hysteresis;
            let hi = self.limit * self.hysteresis;
            if (lo..=hi).contains(&below) && (lo..=hi).contains(&above) {
                return Some(last);
            }
        }

        let clip = AxisRange::new(view_y.min - self.limit * vh, view_y.max + self.limit * vh);
        trace!(min = clip.min, max = clip.max, "dynamic range clip window moved");
        self.last_clip = Some(clip);
        Some(clip)
    }
}
