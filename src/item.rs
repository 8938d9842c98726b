//! Capability interface between plot items and the pipeline.
//!
//! Items of every kind report their bounds for auto-ranging and expose their
//! samples for decimation. The concrete kinds are variants of [`PlotItem`];
//! item catalogs outside this crate can implement [`ItemSource`] directly.

use crate::data_types::{AxisMappings, DataSeries, ImageGrid, MappedSeries};
use crate::decimation::{GridPolicy, ReductionOptions};
use crate::rendering::Style;
use crate::view_range::{Axis, AxisRange};

/// Extent of an item on one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AxisBounds {
    Finite(AxisRange),
    /// Extends forever on this axis (e.g. a horizontal line along x).
    Unbounded,
    /// Nothing finite to report.
    Empty,
}

impl AxisBounds {
    pub fn finite(&self) -> Option<AxisRange> {
        match self {
            AxisBounds::Finite(r) if r.min.is_finite() && r.max.is_finite() => Some(*r),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemBounds {
    pub x: AxisBounds,
    pub y: AxisBounds,
}

impl ItemBounds {
    pub const EMPTY: ItemBounds = ItemBounds {
        x: AxisBounds::Empty,
        y: AxisBounds::Empty,
    };

    pub fn axis(&self, axis: Axis) -> &AxisBounds {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

pub trait ItemSource {
    fn bounds(&self) -> ItemBounds;

    /// View-space samples for decimation, if the item is series-backed.
    fn data(&self) -> Option<&DataSeries>;

    /// Pixels the item draws beyond its data bounds (e.g. symbol radius).
    fn pixel_padding(&self) -> f64 {
        0.0
    }

    fn is_visible(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug)]
pub struct CurveItem {
    pub data: MappedSeries,
    pub style: Style,
    /// Central fraction of the data used for auto-range (1.0 = everything).
    pub bounds_fraction: f64,
    pub reduction: ReductionOptions,
    pub visible: bool,
}

impl CurveItem {
    pub fn new(series: DataSeries) -> Self {
        Self {
            data: MappedSeries::from(series),
            style: Style::default(),
            bounds_fraction: 1.0,
            reduction: ReductionOptions::default(),
            visible: true,
        }
    }

    /// Plots log10 of the data on the flagged axes.
    pub fn set_log_mode(&mut self, x: bool, y: bool) {
        self.data.set_mappings(AxisMappings::log(x, y));
    }

    pub fn with_reduction(mut self, reduction: ReductionOptions) -> Self {
        self.reduction = reduction;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ScatterItem {
    pub data: MappedSeries,
    pub style: Style,
    pub visible: bool,
}

impl ScatterItem {
    pub fn new(series: DataSeries) -> Self {
        Self {
            data: MappedSeries::from(series),
            style: Style::points(),
            visible: true,
        }
    }

    pub fn set_log_mode(&mut self, x: bool, y: bool) {
        self.data.set_mappings(AxisMappings::log(x, y));
    }
}

#[derive(Clone, Debug)]
pub struct ImageItem {
    pub grid: ImageGrid,
    pub policy: GridPolicy,
    pub visible: bool,
}

impl ImageItem {
    pub fn new(grid: ImageGrid) -> Self {
        Self {
            grid,
            policy: GridPolicy::Mean,
            visible: true,
        }
    }
}

/// Line spanning the whole view, perpendicular to `axis` at `position`.
#[derive(Clone, Debug)]
pub struct InfiniteLine {
    pub axis: Axis,
    pub position: f64,
    pub style: Style,
}

#[derive(Clone, Debug)]
pub enum PlotItem {
    Curve(CurveItem),
    Scatter(ScatterItem),
    Image(ImageItem),
    InfiniteLine(InfiniteLine),
}

fn series_bounds(series: &DataSeries, fraction: f64) -> ItemBounds {
    let to_bounds = |r: Option<AxisRange>| r.map(AxisBounds::Finite).unwrap_or(AxisBounds::Empty);
    if fraction >= 1.0 {
        return match series.data_rect() {
            Some(rect) => ItemBounds {
                x: AxisBounds::Finite(rect.x),
                y: AxisBounds::Finite(rect.y),
            },
            None => ItemBounds::EMPTY,
        };
    }
    ItemBounds {
        x: to_bounds(series.bounds_fraction(Axis::X, fraction)),
        y: to_bounds(series.bounds_fraction(Axis::Y, fraction)),
    }
}

impl ItemSource for PlotItem {
    fn bounds(&self) -> ItemBounds {
        if !self.is_visible() {
            return ItemBounds::EMPTY;
        }
        match self {
            PlotItem::Curve(c) => series_bounds(c.data.display(), c.bounds_fraction),
            PlotItem::Scatter(s) => series_bounds(s.data.display(), 1.0),
            PlotItem::Image(img) => {
                if img.grid.is_empty() {
                    return ItemBounds::EMPTY;
                }
                let rect = img.grid.rect();
                ItemBounds {
                    x: AxisBounds::Finite(rect.x),
                    y: AxisBounds::Finite(rect.y),
                }
            }
            PlotItem::InfiniteLine(line) => {
                let at = AxisBounds::Finite(AxisRange::new(line.position, line.position));
                match line.axis {
                    Axis::X => ItemBounds {
                        x: at,
                        y: AxisBounds::Unbounded,
                    },
                    Axis::Y => ItemBounds {
                        x: AxisBounds::Unbounded,
                        y: at,
                    },
                }
            }
        }
    }

    fn data(&self) -> Option<&DataSeries> {
        match self {
            PlotItem::Curve(c) => Some(c.data.display()),
            PlotItem::Scatter(s) => Some(s.data.display()),
            PlotItem::Image(_) | PlotItem::InfiniteLine(_) => None,
        }
    }

    fn pixel_padding(&self) -> f64 {
        match self {
            PlotItem::Scatter(s) => (s.style.point_size as f64) * 0.5,
            _ => 0.0,
        }
    }

    fn is_visible(&self) -> bool {
        match self {
            PlotItem::Curve(c) => c.visible,
            PlotItem::Scatter(s) => s.visible,
            PlotItem::Image(i) => i.visible,
            PlotItem::InfiniteLine(_) => true,
        }
    }
}
