use tracing::debug;

use super::common::{BucketArena, BucketGrid, DecimatedSeries};
use crate::data_types::{DataSeries, Sample};
use crate::view_range::AxisRange;

/// Peak decimator that keeps its bucket arena between frames.
///
/// While the grid and the series epoch are unchanged, `update` only folds
/// samples appended since the previous call. Anything else (a pan, a zoom, a
/// resize, replaced or rolled data) rebuilds from scratch. The output equals
/// [`decimate_peak_on`](super::min_max::decimate_peak_on) for the same input.
#[derive(Debug)]
pub struct IncrementalDecimator {
    threshold: usize,
    arena: Option<BucketArena>,
    epoch: u64,
    consumed: usize,
    monotonic: bool,
    last_touched: usize,
    rebuilds: u64,
}

impl IncrementalDecimator {
    pub fn new(occupancy_threshold: usize) -> Self {
        Self {
            threshold: occupancy_threshold,
            arena: None,
            epoch: 0,
            consumed: 0,
            monotonic: true,
            last_touched: 0,
            rebuilds: 0,
        }
    }

    /// Number of samples folded by the last `update`.
    pub fn last_folded(&self) -> usize {
        self.last_touched
    }

    /// Number of full rebuilds since construction.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn invalidate(&mut self) {
        self.arena = None;
    }

    pub fn update(&mut self, series: &DataSeries, x_range: AxisRange, columns: usize) -> Option<DecimatedSeries> {
        let grid = BucketGrid::new(x_range, columns)?;

        let reusable = self.arena.as_ref().is_some_and(|a| a.grid == grid)
            && self.epoch == series.epoch()
            && self.consumed <= series.len()
            // An append that breaks x order changes which neighbours count.
            && self.monotonic == series.is_monotonic_x();

        if !reusable {
            debug!(
                columns,
                len = series.len(),
                epoch = series.epoch(),
                "rebuilding decimation buckets"
            );
            self.arena = Some(BucketArena::new(grid, self.threshold, series.is_monotonic_x()));
            self.epoch = series.epoch();
            self.consumed = 0;
            self.monotonic = series.is_monotonic_x();
            self.rebuilds += 1;
        }

        let arena = self.arena.as_mut()?;
        let start = self.consumed;
        let x = &series.x()[start..];
        let y = &series.y()[start..];
        for (offset, (&x, &y)) in x.iter().zip(y.iter()).enumerate() {
            arena.fold(Sample {
                index: start + offset,
                x,
                y,
            });
        }
        self.last_touched = series.len() - start;
        self.consumed = series.len();

        Some(arena.emit(series.len()))
    }
}
