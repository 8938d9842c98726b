//! Per-axis mapping from data space into view space, applied before
//! decimation, bounds and the view transform.

use serde::{Deserialize, Serialize};

use super::series::DataSeries;
use crate::view_range::{Axis, AxisRange};

/// Smallest log10 value a positive f64 reaches (2.2e-308).
const LOG10_VIEW_MIN: f64 = -307.6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMapping {
    #[default]
    Identity,
    /// Base-10 logarithm. Values `<= 0` have no image and become NaN gaps.
    Log10,
}

impl DataMapping {
    pub fn from_log(log: bool) -> Self {
        if log {
            DataMapping::Log10
        } else {
            DataMapping::Identity
        }
    }

    pub fn is_identity(self) -> bool {
        self == DataMapping::Identity
    }

    #[inline(always)]
    pub fn map(self, value: f64) -> f64 {
        match self {
            DataMapping::Identity => value,
            DataMapping::Log10 => {
                let mapped = value.log10();
                if mapped.is_finite() {
                    mapped
                } else {
                    f64::NAN
                }
            }
        }
    }

    /// View space back to data space. NaN stays NaN.
    pub fn reverse(self, value: f64) -> f64 {
        match self {
            DataMapping::Identity => value,
            DataMapping::Log10 => 10f64.powf(value),
        }
    }

    /// Widest view-space range the mapping can produce. Identity stops at a
    /// quarter of the f64 range so spans stay finite.
    pub fn view_limits(self) -> AxisRange {
        match self {
            DataMapping::Identity => AxisRange::new(f64::MIN / 4.0, f64::MAX / 4.0),
            DataMapping::Log10 => AxisRange::new(LOG10_VIEW_MIN, f64::MAX.log10()),
        }
    }

    /// Maps `values` into `out`. Returns true when some result is not finite.
    pub fn map_into(self, values: &[f64], out: &mut Vec<f64>) -> bool {
        out.clear();
        out.extend(values.iter().map(|&v| self.map(v)));
        out.iter().any(|v| !v.is_finite())
    }
}

/// Mappings of both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisMappings {
    pub x: DataMapping,
    pub y: DataMapping,
}

impl AxisMappings {
    pub fn log(x: bool, y: bool) -> Self {
        Self {
            x: DataMapping::from_log(x),
            y: DataMapping::from_log(y),
        }
    }

    pub fn axis(&self, axis: Axis) -> DataMapping {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_identity() && self.y.is_identity()
    }

    fn map_series(&self, source: &DataSeries) -> DataSeries {
        let mut x = Vec::with_capacity(source.len());
        let mut y = Vec::with_capacity(source.len());
        self.x.map_into(source.x(), &mut x);
        self.y.map_into(source.y(), &mut y);
        let mapped = DataSeries::new(x, y);
        match source.max_len() {
            Some(limit) => mapped.with_max_len(limit),
            None => mapped,
        }
    }
}

/// A series together with its view-space image.
///
/// The mapped copy exists only while some axis is not identity. Appends are
/// mapped and appended in place, so the mapped series keeps its epoch and
/// incremental decimation still applies.
#[derive(Clone, Debug, Default)]
pub struct MappedSeries {
    source: DataSeries,
    mappings: AxisMappings,
    mapped: Option<DataSeries>,
}

impl From<DataSeries> for MappedSeries {
    fn from(source: DataSeries) -> Self {
        Self::new(source, AxisMappings::default())
    }
}

impl MappedSeries {
    pub fn new(source: DataSeries, mappings: AxisMappings) -> Self {
        let mut series = Self {
            source,
            mappings,
            mapped: None,
        };
        series.remap();
        series
    }

    fn remap(&mut self) {
        self.mapped = (!self.mappings.is_identity()).then(|| self.mappings.map_series(&self.source));
    }

    /// Samples as supplied, before mapping.
    pub fn source(&self) -> &DataSeries {
        &self.source
    }

    /// Samples in view space; what bounds, decimation and rendering see.
    pub fn display(&self) -> &DataSeries {
        self.mapped.as_ref().unwrap_or(&self.source)
    }

    pub fn mappings(&self) -> AxisMappings {
        self.mappings
    }

    pub fn set_mappings(&mut self, mappings: AxisMappings) {
        if mappings != self.mappings {
            self.mappings = mappings;
            self.remap();
        }
    }

    pub fn set_data(&mut self, x: Vec<f64>, y: Vec<f64>) {
        self.source.set_data(x, y);
        self.remap();
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.source.push(x, y);
        if let Some(mapped) = self.mapped.as_mut() {
            mapped.push(self.mappings.x.map(x), self.mappings.y.map(y));
        }
    }

    pub fn extend(&mut self, x: &[f64], y: &[f64]) {
        self.source.extend(x, y);
        if let Some(mapped) = self.mapped.as_mut() {
            let mut mx = Vec::new();
            let mut my = Vec::new();
            self.mappings.x.map_into(x, &mut mx);
            self.mappings.y.map_into(y, &mut my);
            mapped.extend(&mx, &my);
        }
    }
}
