use rayon::prelude::*;
use tracing::trace;

use super::common::{BucketArena, BucketGrid, BucketState, DecimatedSeries};
use crate::config::DecimationConfig;
use crate::data_types::{DataSeries, Sample};
use crate::view_range::AxisRange;

/// Visible sample count above which buckets are aggregated on the rayon pool.
const PARALLEL_MIN_SAMPLES: usize = 1 << 16;

/// Peak decimation of the samples whose x lies in `x_range` into `columns`
/// pixel columns.
///
/// Dense columns emit their min and max sample in index order. Columns with
/// at most `occupancy_threshold` samples emit them unchanged. The first and
/// last sample of the series are always emitted when visible. Returns `None`
/// when the range or column count cannot form a grid.
pub fn decimate_peak(
    series: &DataSeries,
    x_range: AxisRange,
    columns: usize,
    config: &DecimationConfig,
) -> Option<DecimatedSeries> {
    let grid = BucketGrid::new(x_range, columns)?;
    Some(decimate_peak_on(series, grid, config.occupancy_threshold))
}

pub fn decimate_peak_on(series: &DataSeries, grid: BucketGrid, threshold: usize) -> DecimatedSeries {
    if series.is_empty() {
        return DecimatedSeries::empty(grid);
    }
    match series.visible_indices(grid.x_min, grid.x_max) {
        Some(window) => decimate_sorted(series, grid, threshold, window),
        None => decimate_scan(series, grid, threshold),
    }
}

/// Monotonic x: column boundaries by binary search, columns aggregated
/// independently.
fn decimate_sorted(
    series: &DataSeries,
    grid: BucketGrid,
    threshold: usize,
    window: std::ops::Range<usize>,
) -> DecimatedSeries {
    let x = &series.x()[window.clone()];
    let y = &series.y()[window.clone()];
    let offset = window.start;

    let ranges = grid.column_ranges(x);
    let aggregate = |(col, range): &(usize, std::ops::Range<usize>)| {
        let mut indices = range.clone();
        let Some(i0) = indices.next() else {
            return None;
        };
        let sample = |i: usize| Sample {
            index: offset + i,
            x: x[i],
            y: y[i],
        };
        let mut state = BucketState::start(*col, sample(i0), threshold);
        for i in indices {
            state.push(sample(i), threshold);
        }
        Some(state)
    };

    let states: Vec<Option<BucketState>> = if window.len() >= PARALLEL_MIN_SAMPLES {
        ranges.par_iter().map(aggregate).collect()
    } else {
        ranges.iter().map(aggregate).collect()
    };

    let mut arena = BucketArena::new(grid, threshold, true);
    for state in states.into_iter().flatten() {
        arena.insert(state);
    }
    let lead_in = window.start.checked_sub(1).and_then(|i| series.sample(i));
    let lead_out = series.sample(window.end);
    arena.set_neighbors(lead_in, lead_out);

    trace!(
        visible = window.len(),
        columns = grid.columns,
        occupied = arena.occupied(),
        "peak decimation (sorted)"
    );
    arena.emit(series.len())
}

/// Arbitrary x order: one linear pass into the bucket arena.
fn decimate_scan(series: &DataSeries, grid: BucketGrid, threshold: usize) -> DecimatedSeries {
    let mut arena = BucketArena::new(grid, threshold, series.is_monotonic_x());
    for (index, (&x, &y)) in series.x().iter().zip(series.y().iter()).enumerate() {
        arena.fold(Sample { index, x, y });
    }
    trace!(
        len = series.len(),
        columns = grid.columns,
        occupied = arena.occupied(),
        "peak decimation (scan)"
    );
    arena.emit(series.len())
}
