use tracing::warn;

use crate::view_range::ViewRange;

/// Row-major 2D grid of scalar values covering a data rectangle. Row 0 lies
/// at `rect.y.min`, column 0 at `rect.x.min`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageGrid {
    cols: usize,
    rows: usize,
    values: Vec<f64>,
    rect: ViewRange,
}

impl ImageGrid {
    /// Builds a grid; `values` shorter than `cols * rows` are padded with NaN,
    /// longer ones truncated.
    pub fn new(cols: usize, rows: usize, mut values: Vec<f64>, rect: ViewRange) -> Self {
        let n = cols * rows;
        if values.len() != n {
            warn!(expected = n, got = values.len(), "grid size mismatch");
            values.resize(n, f64::NAN);
        }
        Self {
            cols,
            rows,
            values,
            rect,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn rect(&self) -> ViewRange {
        self.rect
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        self.values.get(start..start + self.cols).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
