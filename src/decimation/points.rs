use glam::DVec2;
use tracing::trace;

use crate::view_range::Viewport;

/// Occupancy bitmap over square device cells of a viewport.
///
/// Symbols are thinned to the first one landing in each cell, so a point set
/// never yields more vertices than the viewport has cells. The bitmap is kept
/// between passes and only cleared.
#[derive(Clone, Debug, Default)]
pub struct PixelCells {
    origin: DVec2,
    cell: f64,
    cols: usize,
    rows: usize,
    bits: Vec<u64>,
}

impl PixelCells {
    pub fn new(viewport: &Viewport, cell_px: f64) -> Self {
        let mut cells = Self::default();
        cells.reset(viewport, cell_px);
        cells
    }

    /// Clears every cell and resizes the bitmap to `viewport`.
    pub fn reset(&mut self, viewport: &Viewport, cell_px: f64) {
        let cell = if cell_px.is_finite() && cell_px > 0.0 { cell_px } else { 1.0 };
        let span = |extent: f64| {
            if extent.is_finite() && extent > 0.0 {
                (extent / cell).ceil().max(1.0) as usize
            } else {
                1
            }
        };
        self.origin = DVec2::new(viewport.x, viewport.y);
        self.cell = cell;
        self.cols = span(viewport.width);
        self.rows = span(viewport.height);
        self.bits.clear();
        self.bits.resize((self.cols * self.rows).div_ceil(64), 0);
    }

    pub fn capacity(&self) -> usize {
        self.cols * self.rows
    }

    /// Marks the cell under `p`; true when it was still free. Points past the
    /// edges count toward the nearest edge cell.
    #[inline(always)]
    pub fn insert(&mut self, p: DVec2) -> bool {
        let rel = (p - self.origin) / self.cell;
        let col = (rel.x.max(0.0) as usize).min(self.cols - 1);
        let row = (rel.y.max(0.0) as usize).min(self.rows - 1);
        let bit = row * self.cols + col;
        let (word, mask) = (bit / 64, 1u64 << (bit % 64));
        let free = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        free
    }

    /// Keeps the first finite point of each cell, in order.
    pub fn thin(&mut self, points: &mut Vec<DVec2>) {
        let before = points.len();
        points.retain(|p| p.is_finite() && self.insert(*p));
        trace!(before, after = points.len(), "thinned point set");
    }
}
