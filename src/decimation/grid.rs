use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::data_types::ImageGrid;
use crate::view_range::ViewRange;

/// How a block of grid cells is reduced to one output cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPolicy {
    /// Keeps both extremes, as two channels.
    MinMax,
    #[default]
    Mean,
    Min,
    Max,
    /// Top-left cell of each block.
    Subsample,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridValues {
    Single(Vec<f64>),
    Envelope { min: Vec<f64>, max: Vec<f64> },
}

/// Grid reduced for display, covering the same data rectangle as its source.
#[derive(Clone, Debug, PartialEq)]
pub struct DecimatedGrid {
    pub cols: usize,
    pub rows: usize,
    /// Source cells per output cell along x and y.
    pub block: (usize, usize),
    pub values: GridValues,
    pub rect: ViewRange,
}

impl DecimatedGrid {
    /// Primary channel (the minimum for envelopes).
    pub fn primary(&self) -> &[f64] {
        match &self.values {
            GridValues::Single(v) => v,
            GridValues::Envelope { min, .. } => min,
        }
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.primary().get(row * self.cols + col).copied()
    }
}

/// Block size so that the output has at most `target` cells along an axis.
pub fn block_factor(source: usize, target: usize) -> usize {
    if target == 0 {
        return source.max(1);
    }
    source.div_ceil(target).max(1)
}

/// Reduces `grid` so it has at most `target_cols` x `target_rows` cells.
/// Non-finite cells are ignored; a block with no finite cell becomes NaN.
pub fn decimate_grid(grid: &ImageGrid, target_cols: usize, target_rows: usize, policy: GridPolicy) -> DecimatedGrid {
    let bx = block_factor(grid.cols(), target_cols);
    let by = block_factor(grid.rows(), target_rows);
    let cols = grid.cols().div_ceil(bx);
    let rows = grid.rows().div_ceil(by);

    let reduce_row = |row: usize| -> Vec<(f64, f64)> {
        let r0 = row * by;
        let r1 = (r0 + by).min(grid.rows());
        (0..cols)
            .map(|col| {
                let c0 = col * bx;
                let c1 = (c0 + bx).min(grid.cols());
                reduce_block(grid, c0..c1, r0..r1, policy)
            })
            .collect()
    };

    let reduced: Vec<Vec<(f64, f64)>> = (0..rows).into_par_iter().map(reduce_row).collect();
    let flat = reduced.into_iter().flatten();

    let values = match policy {
        GridPolicy::MinMax => {
            let (min, max) = flat.unzip();
            GridValues::Envelope { min, max }
        }
        _ => GridValues::Single(flat.map(|(v, _)| v).collect()),
    };

    trace!(
        src_cols = grid.cols(),
        src_rows = grid.rows(),
        cols,
        rows,
        "grid decimated"
    );
    DecimatedGrid {
        cols,
        rows,
        block: (bx, by),
        values,
        rect: grid.rect(),
    }
}

fn reduce_block(
    grid: &ImageGrid,
    cols: std::ops::Range<usize>,
    rows: std::ops::Range<usize>,
    policy: GridPolicy,
) -> (f64, f64) {
    if policy == GridPolicy::Subsample {
        let v = grid.get(cols.start, rows.start).unwrap_or(f64::NAN);
        return (v, v);
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut n = 0usize;
    for r in rows {
        for &v in grid.row(r).get(cols.clone()).unwrap_or(&[]) {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
                sum += v;
                n += 1;
            }
        }
    }
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    match policy {
        GridPolicy::Mean => {
            let m = sum / n as f64;
            (m, m)
        }
        GridPolicy::Min => (lo, lo),
        GridPolicy::Max => (hi, hi),
        GridPolicy::MinMax | GridPolicy::Subsample => (lo, hi),
    }
}
