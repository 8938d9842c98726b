use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::view_range::{Axis, AxisRange, ViewRange};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// Extra samples kept above the rolling limit before the front is dropped,
/// so a full buffer is not compacted on every append.
const ROLL_SLACK_DIVISOR: usize = 8;

/// One sample of a series, with its position in the series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug)]
struct FiniteBounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl FiniteBounds {
    const EMPTY: FiniteBounds = FiniteBounds {
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };

    fn include(&mut self, x: f64, y: f64) -> bool {
        let mut finite = true;
        if x.is_finite() {
            self.x_min = self.x_min.min(x);
            self.x_max = self.x_max.max(x);
        } else {
            finite = false;
        }
        if y.is_finite() {
            self.y_min = self.y_min.min(y);
            self.y_max = self.y_max.max(y);
        } else {
            finite = false;
        }
        finite
    }
}

/// Ordered (x, y) samples owned by a plot item.
///
/// The series tracks its finite bounds, whether x is non-decreasing, and an
/// epoch that changes whenever samples are replaced or dropped (but not when
/// they are only appended), which lets incremental consumers tell the two
/// apart.
#[derive(Clone, Debug)]
pub struct DataSeries {
    x: Vec<f64>,
    y: Vec<f64>,
    epoch: u64,
    monotonic_x: bool,
    contains_non_finite: bool,
    non_finite_x: bool,
    last_finite_x: Option<f64>,
    bounds: FiniteBounds,
    max_len: Option<usize>,
}

impl Default for DataSeries {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl DataSeries {
    /// Builds a series; mismatched lengths are truncated to the shorter one.
    pub fn new(mut x: Vec<f64>, mut y: Vec<f64>) -> Self {
        if x.len() != y.len() {
            warn!(x_len = x.len(), y_len = y.len(), "mismatched series lengths, truncating");
            let n = x.len().min(y.len());
            x.truncate(n);
            y.truncate(n);
        }
        let mut series = Self {
            x,
            y,
            epoch: next_epoch(),
            monotonic_x: true,
            contains_non_finite: false,
            non_finite_x: false,
            last_finite_x: None,
            bounds: FiniteBounds::EMPTY,
            max_len: None,
        };
        series.rescan();
        series
    }

    /// Uses the sample index as x.
    pub fn from_y(y: Vec<f64>) -> Self {
        let x = (0..y.len()).map(|i| i as f64).collect();
        Self::new(x, y)
    }

    /// Rolling mode: once the series grows past `limit` plus an eighth of
    /// `limit`, the oldest samples are dropped to bring it back to `limit`.
    pub fn with_max_len(mut self, limit: usize) -> Self {
        self.max_len = Some(limit.max(1));
        self.roll();
        self
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    fn rescan(&mut self) {
        self.bounds = FiniteBounds::EMPTY;
        self.contains_non_finite = false;
        self.non_finite_x = false;
        self.monotonic_x = true;
        self.last_finite_x = None;
        let mut last_x = f64::NEG_INFINITY;
        for (&x, &y) in self.x.iter().zip(self.y.iter()) {
            if !self.bounds.include(x, y) {
                self.contains_non_finite = true;
            }
            if x.is_finite() {
                if x < last_x {
                    self.monotonic_x = false;
                }
                last_x = x;
                self.last_finite_x = Some(x);
            } else {
                self.non_finite_x = true;
            }
        }
    }

    /// Replaces all samples.
    pub fn set_data(&mut self, x: Vec<f64>, y: Vec<f64>) {
        let max_len = self.max_len;
        *self = Self::new(x, y);
        self.max_len = max_len;
        self.roll();
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.append_one(x, y);
        self.roll();
    }

    pub fn extend(&mut self, x: &[f64], y: &[f64]) {
        for (&xv, &yv) in x.iter().zip(y.iter()) {
            self.append_one(xv, yv);
        }
        self.roll();
    }

    fn append_one(&mut self, x: f64, y: f64) {
        if x.is_finite() {
            if self.last_finite_x.is_some_and(|last| x < last) {
                self.monotonic_x = false;
            }
            self.last_finite_x = Some(x);
        } else {
            self.non_finite_x = true;
        }
        if !self.bounds.include(x, y) {
            self.contains_non_finite = true;
        }
        self.x.push(x);
        self.y.push(y);
    }

    fn roll(&mut self) {
        let Some(limit) = self.max_len else {
            return;
        };
        if self.x.len() <= limit + limit / ROLL_SLACK_DIVISOR {
            return;
        }
        let excess = self.x.len() - limit;
        self.x.drain(..excess);
        self.y.drain(..excess);
        self.epoch = next_epoch();
        self.rescan();
        debug!(dropped = excess, len = self.x.len(), "rolled series buffer");
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True when finite x values never decrease.
    pub fn is_monotonic_x(&self) -> bool {
        self.monotonic_x
    }

    pub fn contains_non_finite(&self) -> bool {
        self.contains_non_finite
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            index,
            x: *self.x.get(index)?,
            y: *self.y.get(index)?,
        })
    }

    pub fn first(&self) -> Option<Sample> {
        self.sample(0)
    }

    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Bounds of the finite samples; `None` when no sample is finite on some axis.
    pub fn data_rect(&self) -> Option<ViewRange> {
        let b = self.bounds;
        if b.x_min > b.x_max || b.y_min > b.y_max {
            return None;
        }
        Some(ViewRange::new(b.x_min, b.x_max, b.y_min, b.y_max))
    }

    /// Range holding the central `fraction` of the finite values on one axis,
    /// which lets auto-range ignore rare spikes.
    pub fn bounds_fraction(&self, axis: Axis, fraction: f64) -> Option<AxisRange> {
        let rect = self.data_rect()?;
        let full = *rect.axis(axis);
        if fraction >= 1.0 {
            return Some(full);
        }
        let source = match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        };
        let mut finite: Vec<f64> = source.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        finite.sort_by(|a, b| a.total_cmp(b));
        let fraction = fraction.clamp(0.0, 1.0);
        let last = (finite.len() - 1) as f64;
        let lo = ((0.5 * (1.0 - fraction)) * last).round() as usize;
        let hi = ((0.5 * (1.0 + fraction)) * last).round() as usize;
        Some(AxisRange::new(finite[lo], finite[hi]))
    }

    /// Index window `[start, end)` of samples with `x_min <= x <= x_max`.
    /// Requires monotonic x; returns `None` otherwise.
    pub fn visible_indices(&self, x_min: f64, x_max: f64) -> Option<std::ops::Range<usize>> {
        if !self.monotonic_x || self.non_finite_x {
            return None;
        }
        let start = self.x.partition_point(|&v| v < x_min);
        let end = self.x.partition_point(|&v| v <= x_max);
        Some(start..end.max(start))
    }

    /// Finite y range of samples whose x lies in `[x_min, x_max]`.
    pub fn y_range_within(&self, x_min: f64, x_max: f64) -> Option<AxisRange> {
        let (xs, ys) = match self.visible_indices(x_min, x_max) {
            Some(r) => (&self.x[r.clone()], &self.y[r]),
            None => (&self.x[..], &self.y[..]),
        };
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            if x >= x_min && x <= x_max && y.is_finite() {
                lo = lo.min(y);
                hi = hi.max(y);
            }
        }
        if lo <= hi {
            Some(AxisRange::new(lo, hi))
        } else {
            None
        }
    }
}
