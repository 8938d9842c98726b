//! Session save/restore of a view.

use bytemuck::{Pod, Zeroable};
use eyre::{bail, ensure, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::auto_range::AutoRangeState;
use crate::data_types::DataMapping;
use crate::transform::Transform2D;
use crate::view_range::{Axis, AxisLimits, ViewRange, Viewport};
use crate::viewbox::{ViewBox, ViewSnapshot};

const FLAG_INVERT_X: u64 = 1;
const FLAG_INVERT_Y: u64 = 1 << 1;

/// Flat numeric record of a range/transform pair.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ViewRecord {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,

    pub viewport_x: f64,
    pub viewport_y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,

    /// Column-major data-to-device matrix.
    pub coefficients: [f64; 9],

    pub generation: u64,
    pub flags: u64,
}

impl ViewRecord {
    pub const SIZE: usize = std::mem::size_of::<ViewRecord>();

    pub fn from_snapshot(snapshot: &ViewSnapshot, invert_x: bool, invert_y: bool) -> Self {
        let mut flags = 0;
        if invert_x {
            flags |= FLAG_INVERT_X;
        }
        if invert_y {
            flags |= FLAG_INVERT_Y;
        }
        Self {
            x_min: snapshot.range.x.min,
            x_max: snapshot.range.x.max,
            y_min: snapshot.range.y.min,
            y_max: snapshot.range.y.max,
            viewport_x: snapshot.viewport.x,
            viewport_y: snapshot.viewport.y,
            viewport_width: snapshot.viewport.width,
            viewport_height: snapshot.viewport.height,
            coefficients: snapshot.transform.to_coefficients(),
            generation: snapshot.generation,
            flags,
        }
    }

    pub fn capture(view: &ViewBox) -> Self {
        Self::from_snapshot(
            &view.snapshot(),
            view.axis_options(Axis::X).inverted,
            view.axis_options(Axis::Y).inverted,
        )
    }

    pub fn range(&self) -> ViewRange {
        ViewRange::new(self.x_min, self.x_max, self.y_min, self.y_max)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_x, self.viewport_y, self.viewport_width, self.viewport_height)
    }

    pub fn transform(&self) -> Transform2D {
        Transform2D::from_coefficients(&self.coefficients)
    }

    pub fn invert_x(&self) -> bool {
        self.flags & FLAG_INVERT_X != 0
    }

    pub fn invert_y(&self) -> bool {
        self.flags & FLAG_INVERT_Y != 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: ViewRecord = bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|e| eyre::eyre!("{e:?}"))
            .wrap_err_with(|| format!("view record must be {} bytes, got {}", Self::SIZE, bytes.len()))?;
        ensure!(record.range().is_valid(), "view record holds an invalid range");
        Ok(record)
    }

    pub fn apply(&self, view: &mut ViewBox) -> Result<()> {
        view.set_inverted(Axis::X, self.invert_x())?;
        view.set_inverted(Axis::Y, self.invert_y())?;
        view.resize(self.viewport()).wrap_err("failed to restore viewport")?;
        view.set_view_range(self.range()).wrap_err("failed to restore view range")?;
        Ok(())
    }
}

/// Full, human-readable view state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub range: ViewRange,
    pub viewport: Viewport,
    pub invert_x: bool,
    pub invert_y: bool,
    #[serde(default)]
    pub x_limits: AxisLimits,
    #[serde(default)]
    pub y_limits: AxisLimits,
    #[serde(default)]
    pub auto_range: AutoRangeState,
    #[serde(default)]
    pub aspect: Option<f64>,
    #[serde(default)]
    pub x_mapping: DataMapping,
    #[serde(default)]
    pub y_mapping: DataMapping,
}

impl ViewState {
    pub fn capture(view: &ViewBox) -> Self {
        Self {
            range: view.range(),
            viewport: view.viewport(),
            invert_x: view.axis_options(Axis::X).inverted,
            invert_y: view.axis_options(Axis::Y).inverted,
            x_limits: view.axis_options(Axis::X).limits,
            y_limits: view.axis_options(Axis::Y).limits,
            auto_range: *view.auto_range(),
            aspect: view.aspect(),
            x_mapping: view.axis_options(Axis::X).mapping,
            y_mapping: view.axis_options(Axis::Y).mapping,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let state: ViewState = serde_json::from_str(json).wrap_err("failed to parse view state")?;
        if !state.range.is_valid() {
            bail!("view state holds an invalid range");
        }
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize view state")
    }

    /// Restores this state. The auto-range flags are applied last so the
    /// explicit range does not switch them off.
    pub fn apply(&self, view: &mut ViewBox) -> Result<()> {
        view.set_inverted(Axis::X, self.invert_x)?;
        view.set_inverted(Axis::Y, self.invert_y)?;
        view.set_limits(Axis::X, self.x_limits)?;
        view.set_limits(Axis::Y, self.y_limits)?;
        view.set_data_mapping(Axis::X, self.x_mapping)?;
        view.set_data_mapping(Axis::Y, self.y_mapping)?;
        view.resize(self.viewport).wrap_err("failed to restore viewport")?;
        view.lock_aspect(self.aspect)?;
        view.set_view_range(self.range).wrap_err("failed to restore view range")?;
        view.set_auto_range(self.auto_range);
        Ok(())
    }
}
