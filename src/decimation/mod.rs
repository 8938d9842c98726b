pub mod common;
pub mod grid;
pub mod incremental;
pub mod methods;
pub mod min_max;
pub mod points;
pub mod range_limit;

pub use common::{find_extrema_indices_f64, Bucket, BucketGrid, DecimatedSeries};
pub use grid::{block_factor, decimate_grid, DecimatedGrid, GridPolicy, GridValues};
pub use incremental::IncrementalDecimator;
pub use methods::{
    auto_factor, clip_to_view, downsample, reduce_for_display, DownsampleMethod, Downsampled, ReductionOptions,
};
pub use min_max::{decimate_peak, decimate_peak_on};
pub use points::PixelCells;
pub use range_limit::DynamicRangeLimiter;
