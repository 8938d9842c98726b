//! Render dispatch: turns plot items into device-space primitives for a
//! [`PaintSurface`].

use glam::DVec2;
use tracing::{trace, warn};

use crate::config::{DecimationConfig, RenderConfig};
use crate::data_types::{DataSeries, Sample};
use crate::decimation::{
    decimate_grid, reduce_for_display, DecimatedGrid, DecimatedSeries, DynamicRangeLimiter, IncrementalDecimator,
    PixelCells, ReductionOptions,
};
use crate::error::{Result, ViewError};
use crate::item::{CurveItem, ImageItem, InfiniteLine, ItemSource, PlotItem};
use crate::simd::{batch_transform_samples, finite_min_max_f64};
use crate::transform::Transform2D;
use crate::view_range::{Axis, AxisRange, ViewRange};
use crate::viewbox::ViewSnapshot;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    /// Linear RGBA.
    pub color: [f32; 4],
    pub width: f32,
    /// Symbol diameter in pixels; 0 draws no symbols.
    pub point_size: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            width: 1.0,
            point_size: 0.0,
        }
    }
}

impl Style {
    pub fn points() -> Self {
        Self {
            point_size: 5.0,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// A reduced grid placed in device coordinates.
///
/// `device_min`/`device_max` bound the blit. `origin` is where the data
/// corner `(x.min, y.min)` lands, i.e. the outer corner of cell (0, 0), and
/// `opposite` is the corner `(x.max, y.max)`. Their order on each axis tells
/// which way columns and rows run on screen.
#[derive(Clone, Copy, Debug)]
pub struct ImageBlit<'a> {
    pub grid: &'a DecimatedGrid,
    /// Finite value range of the grid, for colour mapping.
    pub levels: Option<(f64, f64)>,
    pub device_min: DVec2,
    pub device_max: DVec2,
    pub origin: DVec2,
    pub opposite: DVec2,
}

impl ImageBlit<'_> {
    /// Device rectangle `(min corner, size)` of one reduced cell.
    pub fn cell_rect(&self, col: usize, row: usize) -> (DVec2, DVec2) {
        let step = DVec2::new(
            (self.opposite.x - self.origin.x) / self.grid.cols.max(1) as f64,
            (self.opposite.y - self.origin.y) / self.grid.rows.max(1) as f64,
        );
        let a = self.origin + DVec2::new(col as f64 * step.x, row as f64 * step.y);
        let b = a + step;
        (a.min(b), step.abs())
    }
}

/// Drawing backend. Coordinates are device pixels.
pub trait PaintSurface {
    fn is_drawable(&self) -> bool;
    fn draw_polyline(&mut self, points: &[DVec2], style: &Style);
    fn draw_points(&mut self, points: &[DVec2], style: &Style);
    fn draw_image(&mut self, image: &ImageBlit<'_>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemReport {
    pub index: usize,
    /// Vertices (or symbols) handed to the surface.
    pub vertices: usize,
    pub primitives: usize,
    pub error: Option<ViewError>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderReport {
    pub generation: u64,
    pub items: Vec<ItemReport>,
}

impl RenderReport {
    pub fn errors(&self) -> impl Iterator<Item = (usize, &ViewError)> {
        self.items
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| (r.index, e)))
    }

    pub fn vertices(&self) -> usize {
        self.items.iter().map(|r| r.vertices).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DisplayKey {
    epoch: u64,
    len: usize,
    view_x: AxisRange,
    width: f64,
    options: ReductionOptions,
}

/// Last reduced display series, rebuilt when its inputs change.
#[derive(Debug, Default)]
struct DisplayCache {
    key: Option<DisplayKey>,
    series: DataSeries,
}

impl DisplayCache {
    fn refresh(
        &mut self,
        source: &DataSeries,
        view_x: &AxisRange,
        width: f64,
        options: &ReductionOptions,
        config: &DecimationConfig,
    ) -> &DataSeries {
        let key = DisplayKey {
            epoch: source.epoch(),
            len: source.len(),
            view_x: *view_x,
            width,
            options: *options,
        };
        if self.key != Some(key) {
            self.series = reduce_for_display(source, view_x, width, options, config);
            self.key = Some(key);
            trace!(from = source.len(), to = self.series.len(), "display series reduced");
        }
        &self.series
    }
}

/// Per-item caches kept between passes.
#[derive(Debug)]
struct ItemCache {
    decimator: IncrementalDecimator,
    limiter: Option<DynamicRangeLimiter>,
    display: DisplayCache,
}

pub struct RenderDispatcher {
    config: RenderConfig,
    decimation: DecimationConfig,
    caches: Vec<ItemCache>,
    scratch: Vec<DVec2>,
    cells: PixelCells,
}

impl RenderDispatcher {
    pub fn new(config: RenderConfig, decimation: DecimationConfig) -> Self {
        Self {
            config,
            decimation,
            caches: Vec::new(),
            scratch: Vec::new(),
            cells: PixelCells::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn new_cache(&self) -> ItemCache {
        ItemCache {
            decimator: IncrementalDecimator::new(self.decimation.occupancy_threshold),
            limiter: self
                .decimation
                .dynamic_range_limit
                .map(|limit| DynamicRangeLimiter::new(limit, self.decimation.dynamic_range_hysteresis)),
            display: DisplayCache::default(),
        }
    }

    /// Draws every item against one view snapshot.
    ///
    /// Fails only when the surface cannot be drawn on. Per-item problems are
    /// recorded in the report and do not stop the other items.
    pub fn render_pass<S: PaintSurface>(
        &mut self,
        surface: &mut S,
        snapshot: &ViewSnapshot,
        items: &[PlotItem],
    ) -> Result<RenderReport> {
        if !surface.is_drawable() || !snapshot.viewport.is_drawable() {
            return Err(ViewError::SurfaceUnavailable);
        }
        while self.caches.len() < items.len() {
            let cache = self.new_cache();
            self.caches.push(cache);
        }
        self.caches.truncate(items.len());

        let mut report = RenderReport {
            generation: snapshot.generation,
            items: Vec::with_capacity(items.len()),
        };
        for (index, item) in items.iter().enumerate() {
            let mut item_report = ItemReport {
                index,
                vertices: 0,
                primitives: 0,
                error: None,
            };
            if item.is_visible() {
                if let Err(err) = self.render_item(surface, snapshot, index, item, &mut item_report) {
                    warn!(index, error = %err, "plot item skipped");
                    item_report.error = Some(err);
                }
            }
            report.items.push(item_report);
        }
        trace!(
            generation = snapshot.generation,
            items = items.len(),
            vertices = report.vertices(),
            "render pass complete"
        );
        Ok(report)
    }

    fn render_item<S: PaintSurface>(
        &mut self,
        surface: &mut S,
        snapshot: &ViewSnapshot,
        index: usize,
        item: &PlotItem,
        report: &mut ItemReport,
    ) -> Result<()> {
        let transform = &snapshot.transform;
        if transform.is_degenerate() {
            return Err(ViewError::SingularTransform {
                determinant: transform.determinant(),
            });
        }
        match item {
            PlotItem::Curve(curve) => {
                let decimated = self.decimate_curve(index, curve, snapshot);
                self.stroke_decimated(surface, transform, &decimated, &curve.style, report)
            }
            PlotItem::Scatter(scatter) => {
                self.draw_scatter(surface, snapshot, scatter.data.display(), &scatter.style, report)
            }
            PlotItem::Image(image) => Self::draw_image(surface, transform, image, report),
            PlotItem::InfiniteLine(line) => self.draw_infinite_line(surface, transform, &snapshot.range, line, report),
        }
    }

    fn decimate_curve(&mut self, index: usize, curve: &CurveItem, snapshot: &ViewSnapshot) -> DecimatedSeries {
        let columns = snapshot.viewport.pixel_columns();
        let mapped = curve.data.display();
        let cache = &mut self.caches[index];
        let series = if curve.reduction.is_active() {
            cache.display.refresh(
                mapped,
                &snapshot.range.x,
                snapshot.viewport.width,
                &curve.reduction,
                &self.decimation,
            )
        } else {
            mapped
        };
        let mut decimated = match cache.decimator.update(series, snapshot.range.x, columns) {
            Some(d) => d,
            None => return empty_decimation(snapshot),
        };
        if let (Some(limiter), Some(rect)) = (cache.limiter.as_mut(), mapped.data_rect()) {
            if let Some(window) = limiter.window(&rect.y, &snapshot.range.y) {
                decimated.clip_y(&window);
            }
        }
        decimated
    }

    /// Strokes an already decimated series, e.g. one produced off-thread.
    pub fn stroke_decimated<S: PaintSurface>(
        &mut self,
        surface: &mut S,
        transform: &Transform2D,
        decimated: &DecimatedSeries,
        style: &Style,
        report: &mut ItemReport,
    ) -> Result<()> {
        batch_transform_samples(decimated.polyline(), transform, &mut self.scratch);
        let (segments, dropped) = split_finite(&self.scratch);
        for segment in segments {
            if segment.len() < 2 {
                continue;
            }
            let simplified;
            let points = if segment.len() > self.config.simplify_threshold {
                simplified = simplify_collinear(segment, self.config.simplify_tolerance);
                &simplified[..]
            } else {
                segment
            };
            surface.draw_polyline(points, style);
            report.vertices += points.len();
            report.primitives += 1;
        }
        if style.point_size > 0.0 {
            let symbols: Vec<DVec2> = self.scratch.iter().copied().filter(|p| p.is_finite()).collect();
            if !symbols.is_empty() {
                surface.draw_points(&symbols, style);
                report.primitives += 1;
            }
        }
        non_finite_result(dropped)
    }

    /// Draws the visible points, thinned to one symbol per device cell.
    fn draw_scatter<S: PaintSurface>(
        &mut self,
        surface: &mut S,
        snapshot: &ViewSnapshot,
        series: &DataSeries,
        style: &Style,
        report: &mut ItemReport,
    ) -> Result<()> {
        let view = &snapshot.range;
        let mut dropped = 0;
        let visible = series
            .x()
            .iter()
            .zip(series.y().iter())
            .enumerate()
            .filter_map(|(index, (&x, &y))| {
                if !x.is_finite() || !y.is_finite() {
                    dropped += 1;
                    return None;
                }
                (view.x.contains(x) && view.y.contains(y)).then_some(Sample { index, x, y })
            });
        batch_transform_samples(visible, &snapshot.transform, &mut self.scratch);
        self.cells.reset(&snapshot.viewport, self.decimation.scatter_cell_px);
        self.cells.thin(&mut self.scratch);
        if !self.scratch.is_empty() {
            surface.draw_points(&self.scratch, style);
            report.vertices += self.scratch.len();
            report.primitives += 1;
        }
        non_finite_result(dropped)
    }

    fn draw_image<S: PaintSurface>(
        surface: &mut S,
        transform: &Transform2D,
        image: &ImageItem,
        report: &mut ItemReport,
    ) -> Result<()> {
        if image.grid.is_empty() {
            return Ok(());
        }
        let rect = image.grid.rect();
        let corner_min = DVec2::new(rect.x.min, rect.y.min);
        let corner_max = DVec2::new(rect.x.max, rect.y.max);
        let (device_min, device_max) = transform.map_rect(corner_min, corner_max);
        let origin = transform.map_forward(corner_min);
        let opposite = transform.map_forward(corner_max);
        if !device_min.is_finite() || !device_max.is_finite() {
            return Err(ViewError::NonFinitePrimitive { dropped: 1 });
        }
        let extent = device_max - device_min;
        let target_cols = extent.x.ceil().max(1.0) as usize;
        let target_rows = extent.y.ceil().max(1.0) as usize;
        let grid = decimate_grid(&image.grid, target_cols, target_rows, image.policy);
        let levels = finite_min_max_f64(grid.primary());
        surface.draw_image(&ImageBlit {
            grid: &grid,
            levels,
            device_min,
            device_max,
            origin,
            opposite,
        });
        report.vertices += grid.cols * grid.rows;
        report.primitives += 1;
        Ok(())
    }

    fn draw_infinite_line<S: PaintSurface>(
        &mut self,
        surface: &mut S,
        transform: &Transform2D,
        view: &ViewRange,
        line: &InfiniteLine,
        report: &mut ItemReport,
    ) -> Result<()> {
        let p = line.position;
        let ends = match line.axis {
            Axis::X => [DVec2::new(p, view.y.min), DVec2::new(p, view.y.max)],
            Axis::Y => [DVec2::new(view.x.min, p), DVec2::new(view.x.max, p)],
        };
        let device = ends.map(|e| transform.map_forward(e));
        if device.iter().any(|d| !d.is_finite()) {
            return Err(ViewError::NonFinitePrimitive { dropped: 2 });
        }
        surface.draw_polyline(&device, &line.style);
        report.vertices += 2;
        report.primitives += 1;
        Ok(())
    }
}

fn empty_decimation(snapshot: &ViewSnapshot) -> DecimatedSeries {
    use crate::decimation::BucketGrid;
    let grid = BucketGrid {
        x_min: snapshot.range.x.min,
        x_max: snapshot.range.x.max,
        columns: 1,
    };
    DecimatedSeries::empty(grid)
}

fn non_finite_result(dropped: usize) -> Result<()> {
    if dropped > 0 {
        Err(ViewError::NonFinitePrimitive { dropped })
    } else {
        Ok(())
    }
}

/// Splits device points into runs of finite vertices. Returns the runs and
/// the number of non-finite vertices dropped.
pub fn split_finite(points: &[DVec2]) -> (Vec<&[DVec2]>, usize) {
    let mut segments = Vec::new();
    let mut dropped = 0;
    let mut start = 0;
    for (i, p) in points.iter().enumerate() {
        if !p.is_finite() {
            dropped += 1;
            if i > start {
                segments.push(&points[start..i]);
            }
            start = i + 1;
        }
    }
    if start < points.len() {
        segments.push(&points[start..]);
    }
    (segments, dropped)
}

/// Drops vertices lying within `tolerance` pixels of the line joining their
/// neighbours. Endpoints are always kept.
pub fn simplify_collinear(points: &[DVec2], tolerance: f64) -> Vec<DVec2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    for i in 1..n - 1 {
        let a = out[out.len() - 1];
        let b = points[i];
        let c = points[i + 1];
        let ac = c - a;
        let len = ac.length();
        let distance = if len == 0.0 {
            (b - a).length()
        } else {
            ac.perp_dot(b - a).abs() / len
        };
        if distance > tolerance {
            out.push(b);
        }
    }
    out.push(points[n - 1]);
    out
}
