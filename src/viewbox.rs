//! ViewBox: owns the visible data rectangle and its mapping to the viewport.
//!
//! Navigation runs through a small state machine. Every committed change
//! builds a fresh [`Transform2D`] and publishes an immutable [`ViewSnapshot`];
//! readers on other threads keep whatever snapshot they already hold.

use std::sync::Arc;
use std::time::Instant;

use glam::DVec2;
use tracing::{debug, warn};

use crate::auto_range::{AutoRangeState, FitContext, RangeEngine};
use crate::config::PipelineConfig;
use crate::data_types::DataMapping;
use crate::error::{Result, ViewError};
use crate::item::ItemSource;
use crate::publish::Published;
use crate::transform::{Transform2D, TransformStack};
use crate::view_controller::ViewController;
use crate::view_range::{Axis, AxisLimits, AxisRange, ViewRange, Viewport};

/// Weight of the previous velocity when smoothing pan velocity.
const VELOCITY_SMOOTHING: f64 = 0.3;
/// Velocity, in pixels per second, below which inertia stops.
const INERTIA_MIN_VELOCITY: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    PanStart,
    /// Pointer movement in device pixels.
    PanDelta { dx: f64, dy: f64 },
    /// Magnify by `factor` (> 1 zooms in) around a device-pixel position.
    ZoomAt { point: DVec2, factor: f64 },
    PanEnd,
}

impl GestureEvent {
    /// Zoom event for a scroll-wheel delta.
    pub fn wheel(point: DVec2, delta: f32, sensitivity: f32) -> Self {
        GestureEvent::ZoomAt {
            point,
            factor: ViewController::compute_zoom_factor(delta, sensitivity),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavState {
    #[default]
    Idle,
    Panning,
    Zooming,
    AutoRanging,
}

/// The published (range, transform) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSnapshot {
    pub range: ViewRange,
    pub viewport: Viewport,
    pub transform: Transform2D,
    pub generation: u64,
}

impl ViewSnapshot {
    pub fn map_to_device(&self, point: DVec2) -> DVec2 {
        self.transform.map_forward(point)
    }

    pub fn map_to_data(&self, point: DVec2) -> Result<DVec2> {
        self.transform.map_inverse(point)
    }
}

/// Per-axis orientation and interaction flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisOptions {
    pub inverted: bool,
    pub mouse_enabled: bool,
    /// Limits set by the caller.
    pub limits: AxisLimits,
    /// Data-to-view mapping the items on this axis use.
    pub mapping: DataMapping,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            inverted: false,
            mouse_enabled: true,
            limits: AxisLimits::default(),
            mapping: DataMapping::Identity,
        }
    }
}

impl AxisOptions {
    /// Caller limits, with absent position limits taken from the range the
    /// mapping can produce.
    pub fn effective_limits(&self) -> AxisLimits {
        self.limits.within(self.mapping.view_limits())
    }
}

/// Builds the data-to-device transform. Device y grows downward, so data y
/// points up unless the y axis is inverted.
pub fn view_transform(range: &ViewRange, viewport: &Viewport, invert_x: bool, invert_y: bool) -> Transform2D {
    let kx = viewport.width / range.width();
    let ky = viewport.height / range.height();
    let (sx, tx) = if invert_x {
        (-kx, viewport.x + range.x.max * kx)
    } else {
        (kx, viewport.x - range.x.min * kx)
    };
    let (sy, ty) = if invert_y {
        (ky, viewport.y - range.y.min * ky)
    } else {
        (-ky, viewport.y + range.y.max * ky)
    };
    Transform2D::from_scale_translation(sx, sy, tx, ty)
}

pub struct ViewBox {
    config: PipelineConfig,
    engine: RangeEngine,
    range: ViewRange,
    viewport: Viewport,
    axes: [AxisOptions; 2],
    aspect: Option<f64>,
    auto_range: AutoRangeState,
    state: NavState,
    generation: u64,
    published: Arc<Published<ViewSnapshot>>,
    velocity: DVec2,
    last_pan: Option<Instant>,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self::new(PipelineConfig::default(), Viewport::default())
    }
}

impl ViewBox {
    pub fn new(config: PipelineConfig, viewport: Viewport) -> Self {
        let range = config.range.default_range;
        let transform = view_transform(&range, &viewport, false, false);
        let snapshot = ViewSnapshot {
            range,
            viewport,
            transform,
            generation: 0,
        };
        Self {
            engine: RangeEngine::new(config.range.clone()),
            config,
            range,
            viewport,
            axes: [AxisOptions::default(); 2],
            aspect: None,
            auto_range: AutoRangeState::default(),
            state: NavState::Idle,
            generation: 0,
            published: Arc::new(Published::new(snapshot)),
            velocity: DVec2::ZERO,
            last_pan: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn range(&self) -> ViewRange {
        self.range
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn axis_options(&self, axis: Axis) -> &AxisOptions {
        &self.axes[axis.index()]
    }

    pub fn auto_range(&self) -> &AutoRangeState {
        &self.auto_range
    }

    pub fn aspect(&self) -> Option<f64> {
        self.aspect
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<ViewSnapshot> {
        self.published.snapshot()
    }

    /// Shared handle for readers on other threads.
    pub fn publisher(&self) -> Arc<Published<ViewSnapshot>> {
        Arc::clone(&self.published)
    }

    /// Stack rooted at the current data-to-device transform, for items that
    /// compose their own local transforms on top of the view.
    pub fn transform_stack(&self) -> Result<TransformStack> {
        TransformStack::new(&self.snapshot().transform, self.config.renormalize_interval)
    }

    /// Validates, builds the transform and publishes. Nothing changes on error.
    fn commit(&mut self, range: ViewRange, viewport: Viewport) -> Result<()> {
        if !range.is_valid() {
            return Err(ViewError::InvalidRange {
                min: range.x.min.min(range.y.min),
                max: range.x.max.max(range.y.max),
                reason: "view range must be finite and non-empty",
            });
        }
        let transform = view_transform(
            &range,
            &viewport,
            self.axes[0].inverted,
            self.axes[1].inverted,
        );
        if transform.is_degenerate() {
            warn!(
                determinant = transform.determinant(),
                width = viewport.width,
                height = viewport.height,
                "refusing degenerate view transform"
            );
            return Err(ViewError::SingularTransform {
                determinant: transform.determinant(),
            });
        }
        self.range = range;
        self.viewport = viewport;
        self.generation += 1;
        self.published.publish(ViewSnapshot {
            range,
            viewport,
            transform,
            generation: self.generation,
        });
        Ok(())
    }

    fn limits(&self, axis: Axis) -> AxisLimits {
        self.axes[axis.index()].effective_limits()
    }

    fn clamp_to_limits(&self, mut range: ViewRange) -> ViewRange {
        range.x = self.limits(Axis::X).clamp(range.x);
        range.y = self.limits(Axis::Y).clamp(range.y);
        range
    }

    fn with_aspect(&self, range: ViewRange) -> ViewRange {
        match self.aspect {
            Some(ratio) => RangeEngine::lock_aspect(range, &self.viewport, ratio),
            None => range,
        }
    }

    /// Sets one axis. `padding` is a fraction of the span added on each side.
    /// Disables auto-range on that axis.
    pub fn set_range(&mut self, axis: Axis, min: f64, max: f64, padding: Option<f64>) -> Result<()> {
        let mut requested = AxisRange::try_new(min, max)?;
        if let Some(p) = padding {
            requested = requested.padded(p, self.config.range.min_padding);
        }
        let mut next = self.range;
        *next.axis_mut(axis) = self.limits(axis).clamp(requested);
        let next = self.with_aspect(next);
        self.commit(next, self.viewport)?;
        self.auto_range.axis_mut(axis).enabled = false;
        debug!(?axis, min = requested.min, max = requested.max, "range set");
        Ok(())
    }

    pub fn set_view_range(&mut self, range: ViewRange) -> Result<()> {
        let x = AxisRange::try_new(range.x.min, range.x.max)?;
        let y = AxisRange::try_new(range.y.min, range.y.max)?;
        let next = self.with_aspect(self.clamp_to_limits(ViewRange { x, y }));
        self.commit(next, self.viewport)?;
        self.auto_range.x.enabled = false;
        self.auto_range.y.enabled = false;
        Ok(())
    }

    /// Shifts the view by a data-space offset.
    pub fn translate_by(&mut self, dx: f64, dy: f64) -> Result<()> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ViewError::InvalidRange {
                min: dx,
                max: dy,
                reason: "translation must be finite",
            });
        }
        let mut next = self.range;
        next.x.pan(dx);
        next.y.pan(dy);
        let next = self.clamp_to_limits(next);
        self.commit(next, self.viewport)?;
        if dx != 0.0 {
            self.auto_range.x.enabled = false;
        }
        if dy != 0.0 {
            self.auto_range.y.enabled = false;
        }
        Ok(())
    }

    /// Magnifies each axis around `anchor` (data coordinates). `sx = 2` halves
    /// the visible x span; the anchor keeps its device position.
    pub fn scale_by(&mut self, sx: f64, sy: f64, anchor: DVec2) -> Result<()> {
        if !(sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0) || !anchor.is_finite() {
            return Err(ViewError::InvalidRange {
                min: sx,
                max: sy,
                reason: "zoom factors must be finite and positive",
            });
        }
        let next = ViewRange {
            x: ViewController::zoom_axis_at(&self.range.x, anchor.x, sx, &self.limits(Axis::X)),
            y: ViewController::zoom_axis_at(&self.range.y, anchor.y, sy, &self.limits(Axis::Y)),
        };
        self.commit(next, self.viewport)?;
        if sx != 1.0 {
            self.auto_range.x.enabled = false;
        }
        if sy != 1.0 {
            self.auto_range.y.enabled = false;
        }
        Ok(())
    }

    pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let previous = self.viewport;
        self.viewport = viewport;
        let next = self.with_aspect(self.range);
        self.viewport = previous;
        self.commit(next, viewport)
    }

    pub fn set_limits(&mut self, axis: Axis, limits: AxisLimits) -> Result<()> {
        let previous = self.axes[axis.index()].limits;
        self.axes[axis.index()].limits = limits;
        let next = self.clamp_to_limits(self.range);
        if let Err(err) = self.commit(next, self.viewport) {
            self.axes[axis.index()].limits = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_inverted(&mut self, axis: Axis, inverted: bool) -> Result<()> {
        let previous = self.axes[axis.index()].inverted;
        self.axes[axis.index()].inverted = inverted;
        if let Err(err) = self.commit(self.range, self.viewport) {
            self.axes[axis.index()].inverted = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Switches the data mapping of one axis (e.g. log scale). The view range
    /// stays in view space and is clamped to what the mapping can produce.
    pub fn set_data_mapping(&mut self, axis: Axis, mapping: DataMapping) -> Result<()> {
        let previous = self.axes[axis.index()].mapping;
        self.axes[axis.index()].mapping = mapping;
        let next = self.clamp_to_limits(self.range);
        if let Err(err) = self.commit(next, self.viewport) {
            self.axes[axis.index()].mapping = previous;
            return Err(err);
        }
        debug!(?axis, ?mapping, "data mapping set");
        Ok(())
    }

    /// Device position to data coordinates, undoing the axis mappings.
    pub fn map_device_to_data(&self, point: DVec2) -> Result<DVec2> {
        let view = self.snapshot().map_to_data(point)?;
        Ok(DVec2::new(
            self.axes[0].mapping.reverse(view.x),
            self.axes[1].mapping.reverse(view.y),
        ))
    }

    /// Disables pan and zoom gestures on one axis.
    pub fn set_mouse_enabled(&mut self, axis: Axis, enabled: bool) {
        self.axes[axis.index()].mouse_enabled = enabled;
    }

    /// Locks `y_units_per_px / x_units_per_px` to `ratio`, or unlocks.
    pub fn lock_aspect(&mut self, ratio: Option<f64>) -> Result<()> {
        let previous = self.aspect;
        self.aspect = ratio.filter(|r| r.is_finite() && *r > 0.0);
        let next = self.with_aspect(self.range);
        if let Err(err) = self.commit(next, self.viewport) {
            self.aspect = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_auto_range(&mut self, state: AutoRangeState) {
        self.auto_range = state;
    }

    /// Explicit auto-range: re-enables auto-ranging on both axes and fits.
    pub fn request_auto_range<I: ItemSource>(&mut self, items: &[I]) -> Result<ViewRange> {
        self.auto_range.x.enabled = true;
        self.auto_range.y.enabled = true;
        self.run_auto_range(items)
    }

    /// Triggered auto-range (data changed): fits the axes that still have
    /// auto-range enabled. Skipped during interactive navigation.
    pub fn update_auto_range<I: ItemSource>(&mut self, items: &[I]) -> Result<ViewRange> {
        if !self.auto_range.any_enabled() || matches!(self.state, NavState::Panning | NavState::Zooming) {
            return Ok(self.range);
        }
        self.run_auto_range(items)
    }

    fn run_auto_range<I: ItemSource>(&mut self, items: &[I]) -> Result<ViewRange> {
        let previous = self.state;
        self.state = NavState::AutoRanging;
        let fitted = self.engine.fit(
            items,
            FitContext {
                state: &self.auto_range,
                current: &self.range,
                viewport: Some(&self.viewport),
                aspect: self.aspect,
            },
        );
        let next = self.clamp_to_limits(fitted);
        let result = self.commit(next, self.viewport);
        self.state = NavState::Idle;
        debug!(from = ?previous, ok = result.is_ok(), "auto-range committed");
        result.map(|_| self.range)
    }

    pub fn handle_gesture(&mut self, event: GestureEvent) -> Result<()> {
        self.handle_gesture_at(event, Instant::now())
    }

    /// Gesture handling with an explicit timestamp, used for pan velocity.
    pub fn handle_gesture_at(&mut self, event: GestureEvent, now: Instant) -> Result<()> {
        match event {
            GestureEvent::PanStart => {
                self.velocity = DVec2::ZERO;
                self.last_pan = Some(now);
                self.transition(NavState::Panning);
                Ok(())
            }
            GestureEvent::PanDelta { dx, dy } => {
                if self.state != NavState::Panning {
                    self.transition(NavState::Panning);
                }
                self.track_velocity(dx, dy, now);
                self.pan_pixels(dx, dy)
            }
            GestureEvent::ZoomAt { point, factor } => {
                self.velocity = DVec2::ZERO;
                if self.state == NavState::Idle {
                    self.transition(NavState::Zooming);
                }
                self.zoom_at_pixel(point, factor)
            }
            GestureEvent::PanEnd => {
                let stale = self
                    .last_pan
                    .is_some_and(|t| now.saturating_duration_since(t) > self.config.inertia.stop_threshold);
                if stale || !self.config.inertia.enabled {
                    self.velocity = DVec2::ZERO;
                }
                self.last_pan = None;
                self.transition(NavState::Idle);
                Ok(())
            }
        }
    }

    fn transition(&mut self, next: NavState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "navigation state");
            self.state = next;
        }
    }

    fn track_velocity(&mut self, dx: f64, dy: f64, now: Instant) {
        if let Some(last) = self.last_pan {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            if dt > 0.001 {
                let sample = DVec2::new(dx, dy) / dt;
                self.velocity = self.velocity * VELOCITY_SMOOTHING + sample * (1.0 - VELOCITY_SMOOTHING);
            }
        }
        self.last_pan = Some(now);
    }

    fn pan_pixels(&mut self, dx: f64, dy: f64) -> Result<()> {
        let [xo, yo] = self.axes;
        let mut next = self.range;
        if xo.mouse_enabled {
            let limits = xo.effective_limits();
            next.x = ViewController::pan_axis(&self.range.x, dx, self.viewport.width, !xo.inverted, &limits);
        }
        if yo.mouse_enabled {
            let limits = yo.effective_limits();
            next.y = ViewController::pan_axis(&self.range.y, dy, self.viewport.height, yo.inverted, &limits);
        }
        self.commit(next, self.viewport)?;
        if xo.mouse_enabled && dx != 0.0 {
            self.auto_range.x.enabled = false;
        }
        if yo.mouse_enabled && dy != 0.0 {
            self.auto_range.y.enabled = false;
        }
        Ok(())
    }

    fn zoom_at_pixel(&mut self, point: DVec2, factor: f64) -> Result<()> {
        let anchor = self.snapshot().map_to_data(point)?;
        let locked = self.aspect.is_some();
        let fx = if self.axes[0].mouse_enabled || locked { factor } else { 1.0 };
        let fy = if self.axes[1].mouse_enabled || locked { factor } else { 1.0 };
        self.scale_by(fx, fy, anchor)
    }

    /// Advances inertial panning by `dt` seconds. Returns whether the view is
    /// still moving.
    pub fn step_inertia(&mut self, dt: f64) -> Result<bool> {
        if self.state != NavState::Idle || !self.config.inertia.enabled {
            return Ok(false);
        }
        if self.velocity.x.abs() < INERTIA_MIN_VELOCITY && self.velocity.y.abs() < INERTIA_MIN_VELOCITY {
            self.velocity = DVec2::ZERO;
            return Ok(false);
        }
        let friction = self.config.inertia.friction;
        ViewController::apply_friction(&mut self.velocity.x, friction, dt);
        ViewController::apply_friction(&mut self.velocity.y, friction, dt);
        let step = self.velocity * dt * self.config.inertia.sensitivity;
        if let Err(err) = self.pan_pixels(step.x, step.y) {
            self.velocity = DVec2::ZERO;
            return Err(err);
        }
        Ok(self.velocity != DVec2::ZERO)
    }
}
