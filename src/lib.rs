//! viewbox_pipeline: view transforms, auto-ranging and decimation for
//! interactive plotting.
//!
//! A [`ViewBox`] owns the visible data rectangle and publishes an immutable
//! [`ViewSnapshot`] on every change. The [`RenderDispatcher`] reduces each
//! item to at most a few vertices per pixel column and hands device-space
//! primitives to a [`PaintSurface`].

pub mod auto_range;
pub mod config;
pub mod data_types;
pub mod decimation;
pub mod error;
#[cfg(feature = "gpui")]
pub mod gpui_surface;
pub mod item;
pub mod publish;
pub mod rendering;
pub mod simd;
pub mod state;
pub mod transform;
pub mod view_controller;
pub mod view_range;
pub mod viewbox;
pub mod worker;

pub use auto_range::{AutoRangeState, AxisAutoRange, FitContext, RangeEngine};
pub use config::PipelineConfig;
pub use data_types::{DataMapping, DataSeries, ImageGrid, MappedSeries, Sample};
pub use decimation::{DecimatedSeries, GridPolicy, IncrementalDecimator};
pub use error::{Result, ViewError};
pub use item::{ItemBounds, ItemSource, PlotItem};
pub use publish::{HandoffSlot, Published};
pub use rendering::{PaintSurface, RenderDispatcher, RenderReport, Style};
pub use state::{ViewRecord, ViewState};
pub use transform::{Transform2D, Transform3D, TransformStack};
pub use view_controller::ViewController;
pub use view_range::{Axis, AxisLimits, AxisRange, ViewRange, Viewport};
pub use viewbox::{GestureEvent, NavState, ViewBox, ViewSnapshot};
pub use worker::DecimationWorker;
