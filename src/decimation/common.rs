use std::ops::Range;

use crate::data_types::Sample;
use crate::view_range::AxisRange;

/// Partition of a visible x-range into equal-width pixel columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BucketGrid {
    pub x_min: f64,
    pub x_max: f64,
    pub columns: usize,
}

impl BucketGrid {
    pub fn new(x_range: AxisRange, columns: usize) -> Option<Self> {
        if columns == 0 || !x_range.is_valid() {
            return None;
        }
        Some(Self {
            x_min: x_range.min,
            x_max: x_range.max,
            columns,
        })
    }

    pub fn span(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn x_range(&self) -> AxisRange {
        AxisRange::new(self.x_min, self.x_max)
    }

    /// Column holding `x`, or `None` when `x` is outside the grid or not finite.
    /// The right edge belongs to the last column.
    #[inline(always)]
    pub fn column_of(&self, x: f64) -> Option<usize> {
        if !x.is_finite() || x < self.x_min || x > self.x_max {
            return None;
        }
        let c = ((x - self.x_min) / self.span() * self.columns as f64) as usize;
        Some(c.min(self.columns - 1))
    }

    pub fn column_start(&self, column: usize) -> f64 {
        self.x_min + self.span() * column as f64 / self.columns as f64
    }

    /// Splits a slice of non-decreasing x values (all inside the grid) into
    /// per-column index ranges. Empty columns are omitted.
    pub fn column_ranges(&self, x: &[f64]) -> Vec<(usize, Range<usize>)> {
        let mut out = Vec::with_capacity(self.columns.min(x.len()));
        let mut start = 0;
        while start < x.len() {
            let Some(col) = self.column_of(x[start]) else {
                start += 1;
                continue;
            };
            let len = x[start..].partition_point(|&v| self.column_of(v).is_some_and(|c| c <= col));
            let end = start + len.max(1);
            out.push((col, start..end));
            start = end;
        }
        out
    }
}

/// Summary of the samples that fell into one pixel column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bucket {
    pub column: usize,
    pub count: usize,
    /// Samples with a finite y value; extrema only consider those.
    pub finite: usize,
    pub first: Sample,
    pub last: Sample,
    pub min: Sample,
    pub max: Sample,
}

/// Running aggregate of one column, plus the raw samples while the column
/// is still sparse.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketState {
    pub summary: Bucket,
    raw: Vec<Sample>,
}

impl BucketState {
    pub fn start(column: usize, s: Sample, threshold: usize) -> Self {
        let finite = usize::from(s.y.is_finite());
        let mut raw = Vec::with_capacity(threshold.min(4));
        if threshold > 0 {
            raw.push(s);
        }
        Self {
            summary: Bucket {
                column,
                count: 1,
                finite,
                first: s,
                last: s,
                min: s,
                max: s,
            },
            raw,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, s: Sample, threshold: usize) {
        let b = &mut self.summary;
        b.count += 1;
        b.last = s;
        if s.y.is_finite() {
            if b.finite == 0 {
                b.min = s;
                b.max = s;
            } else if s.y < b.min.y {
                b.min = s;
            } else if s.y > b.max.y {
                b.max = s;
            }
            b.finite += 1;
        }
        if b.count <= threshold {
            self.raw.push(s);
        } else if !self.raw.is_empty() {
            self.raw = Vec::new();
        }
    }

    /// Appends the representative samples of this column in index order.
    pub fn emit(&self, threshold: usize, last_index: usize, out: &mut Vec<Sample>) {
        let b = &self.summary;
        if b.count <= threshold {
            out.extend_from_slice(&self.raw);
            return;
        }

        let mut picks = [b.first; 4];
        let mut n = 0;
        if b.first.index == 0 {
            picks[n] = b.first;
            n += 1;
        }
        if b.finite > 0 {
            picks[n] = b.min;
            picks[n + 1] = b.max;
            n += 2;
        } else {
            // Keep the gap visible to the renderer.
            picks[n] = b.first;
            n += 1;
        }
        if b.last.index == last_index {
            picks[n] = b.last;
            n += 1;
        }
        let picks = &mut picks[..n];
        picks.sort_unstable_by_key(|s| s.index);
        let mut prev = None;
        for s in picks.iter() {
            if prev != Some(s.index) {
                out.push(*s);
                prev = Some(s.index);
            }
        }
    }
}

/// Column-indexed storage of bucket states plus the nearest samples just
/// outside the grid, used by both full and incremental decimation.
#[derive(Clone, Debug)]
pub struct BucketArena {
    pub grid: BucketGrid,
    slots: Vec<Option<BucketState>>,
    threshold: usize,
    track_neighbors: bool,
    lead_in: Option<Sample>,
    lead_out: Option<Sample>,
}

impl BucketArena {
    /// `track_neighbors` should only be set for series with monotonic x.
    pub fn new(grid: BucketGrid, threshold: usize, track_neighbors: bool) -> Self {
        Self {
            grid,
            slots: vec![None; grid.columns],
            threshold,
            track_neighbors,
            lead_in: None,
            lead_out: None,
        }
    }

    /// Folds one sample and returns the column it landed in.
    #[inline(always)]
    pub fn fold(&mut self, s: Sample) -> Option<usize> {
        match self.grid.column_of(s.x) {
            Some(col) => {
                match &mut self.slots[col] {
                    Some(state) => state.push(s, self.threshold),
                    slot @ None => *slot = Some(BucketState::start(col, s, self.threshold)),
                }
                Some(col)
            }
            None => {
                if self.track_neighbors && s.x.is_finite() {
                    if s.x < self.grid.x_min {
                        self.lead_in = Some(s);
                    } else if self.lead_out.is_none() {
                        self.lead_out = Some(s);
                    }
                }
                None
            }
        }
    }

    pub fn insert(&mut self, state: BucketState) {
        let col = state.summary.column;
        if col < self.slots.len() {
            self.slots[col] = Some(state);
        }
    }

    pub fn set_neighbors(&mut self, lead_in: Option<Sample>, lead_out: Option<Sample>) {
        self.lead_in = lead_in;
        self.lead_out = lead_out;
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn emit(&self, source_len: usize) -> DecimatedSeries {
        let last_index = source_len.saturating_sub(1);
        let mut buckets = Vec::with_capacity(self.occupied());
        let mut points = Vec::with_capacity(self.occupied() * 2);
        for state in self.slots.iter().flatten() {
            state.emit(self.threshold, last_index, &mut points);
            buckets.push(state.summary);
        }
        DecimatedSeries {
            grid: self.grid,
            buckets,
            points,
            lead_in: self.lead_in,
            lead_out: self.lead_out,
            source_len,
        }
    }
}

/// Screen-column reduction of a series for one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DecimatedSeries {
    grid: BucketGrid,
    buckets: Vec<Bucket>,
    points: Vec<Sample>,
    lead_in: Option<Sample>,
    lead_out: Option<Sample>,
    source_len: usize,
}

impl DecimatedSeries {
    pub fn empty(grid: BucketGrid) -> Self {
        Self {
            grid,
            buckets: Vec::new(),
            points: Vec::new(),
            lead_in: None,
            lead_out: None,
            source_len: 0,
        }
    }

    pub fn grid(&self) -> &BucketGrid {
        &self.grid
    }

    /// Occupied columns, in column order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Representative samples inside the visible range.
    pub fn points(&self) -> &[Sample] {
        &self.points
    }

    /// Nearest samples just outside the visible range (monotonic series only),
    /// so a line can run to the edge of the view.
    pub fn neighbors(&self) -> (Option<Sample>, Option<Sample>) {
        (self.lead_in, self.lead_out)
    }

    /// Vertices to draw as a connected line: neighbours plus points.
    pub fn polyline(&self) -> impl Iterator<Item = Sample> + '_ {
        self.lead_in
            .into_iter()
            .chain(self.points.iter().copied())
            .chain(self.lead_out)
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clamps emitted y values into `window` (dynamic range limiting).
    pub fn clip_y(&mut self, window: &AxisRange) {
        let clip = |s: &mut Sample| {
            if s.y.is_finite() {
                s.y = s.y.clamp(window.min, window.max);
            }
        };
        self.points.iter_mut().for_each(clip);
        self.lead_in.iter_mut().for_each(clip);
        self.lead_out.iter_mut().for_each(clip);
    }
}

/// Scans a slice to find the indices of the minimum and maximum values.
/// NaN values are skipped; returns `None` when every value is NaN.
#[inline(always)]
pub fn find_extrema_indices_f64(chunk: &[f64]) -> Option<(usize, usize)> {
    let mut iter = chunk.iter().enumerate().filter(|(_, v)| v.is_finite());
    let (first_idx, &first) = iter.next()?;
    let (mut min_idx, mut max_idx) = (first_idx, first_idx);
    let (mut min_y, mut max_y) = (first, first);
    for (i, &val) in iter {
        if val < min_y {
            min_y = val;
            min_idx = i;
        } else if val > max_y {
            max_y = val;
            max_idx = i;
        }
    }
    Some((min_idx, max_idx))
}
