//! Off-thread decimation of large static series.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::DecimationConfig;
use crate::data_types::DataSeries;
use crate::decimation::{decimate_peak_on, BucketGrid, DecimatedSeries};
use crate::publish::{HandoffSlot, Tagged};
use crate::view_range::AxisRange;

/// Runs peak decimation on the rayon pool and hands results back through a
/// latest-wins slot. Work for a request that has already been superseded when
/// a job starts is skipped.
pub struct DecimationWorker {
    threshold: usize,
    background_threshold: usize,
    slot: Arc<HandoffSlot<Arc<DecimatedSeries>>>,
}

impl DecimationWorker {
    pub fn new(config: &DecimationConfig) -> Self {
        Self {
            threshold: config.occupancy_threshold,
            background_threshold: config.background_threshold,
            slot: Arc::new(HandoffSlot::new()),
        }
    }

    /// Whether `series` is large enough to be worth decimating off-thread.
    pub fn should_offload(&self, series: &DataSeries) -> bool {
        series.len() >= self.background_threshold
    }

    /// Queues a decimation and returns its generation. Returns `None` when the
    /// range and width cannot form a grid.
    pub fn submit(&self, series: Arc<DataSeries>, x_range: AxisRange, columns: usize) -> Option<u64> {
        let grid = BucketGrid::new(x_range, columns)?;
        let generation = self.slot.request();
        let slot = Arc::clone(&self.slot);
        let threshold = self.threshold;
        debug!(generation, len = series.len(), columns, "decimation submitted");

        rayon::spawn(move || {
            if slot.latest_request() != generation {
                trace!(generation, "decimation superseded before start");
                return;
            }
            let result = decimate_peak_on(&series, grid, threshold);
            if !slot.offer(generation, Arc::new(result)) {
                trace!(generation, "stale decimation result dropped");
            }
        });
        Some(generation)
    }

    /// Result for the latest submission, if it has arrived.
    pub fn take_latest(&self) -> Option<Arc<DecimatedSeries>> {
        self.slot.take_current()
    }

    /// Whatever result is waiting, with the generation it answers.
    pub fn take_tagged(&self) -> Option<Tagged<Arc<DecimatedSeries>>> {
        self.slot.take()
    }

    pub fn latest_generation(&self) -> u64 {
        self.slot.latest_request()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.is_pending()
    }
}
