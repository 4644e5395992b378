//! Sampler and histogram state shared by the tick path and the report path

use super::{BucketAggregator, RateSampler};
use speedlog_types::{SpeedLog, SpeedSample};

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub sample: SpeedSample,
    /// Bucket the sample was counted in; `None` when discarded
    pub threshold: Option<u32>,
}

/// Counters, running total and histogram.
///
/// Every read-modify-write goes through `&mut self`, so the owner decides
/// how access is serialized (see `SpeedMonitor`).
pub struct SpeedLogState {
    sampler: RateSampler,
    aggregator: BucketAggregator,
}

impl SpeedLogState {
    pub fn new(sampler: RateSampler, aggregator: BucketAggregator) -> Self {
        Self {
            sampler,
            aggregator,
        }
    }

    /// Sample the counters once and classify the result
    pub fn record_tick(&mut self) -> TickOutcome {
        let sample = self.sampler.tick();
        let threshold = if sample.has_signal() {
            self.aggregator.classify(sample.bytes_per_ms)
        } else {
            None
        };
        TickOutcome { sample, threshold }
    }

    /// Report everything accumulated since the previous report, then clear it
    pub fn report_and_reset(&mut self) -> SpeedLog {
        SpeedLog {
            total_kb_downloaded: self.sampler.take_total_bytes() / 1024,
            distribution_in_kbps: self.aggregator.take(),
        }
    }

    /// Current accumulation without clearing it
    pub fn peek(&self) -> SpeedLog {
        SpeedLog {
            total_kb_downloaded: self.sampler.total_bytes() / 1024,
            distribution_in_kbps: self.aggregator.snapshot(),
        }
    }

    pub fn aggregator(&self) -> &BucketAggregator {
        &self.aggregator
    }
}
