//! Rate sampler
//!
//! Turns two cumulative counter readings taken an interval apart into an
//! instantaneous throughput, and keeps a running total of bytes moved.

use crate::source::{Clock, TrafficSource};
use speedlog_types::{SpeedSample, TrafficCounters};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Counter values and time of the previous successful reading
#[derive(Debug, Clone, Copy)]
struct Baseline {
    counters: TrafficCounters,
    time_ms: u64,
}

/// Samples throughput from a `TrafficSource`
pub struct RateSampler {
    source: Arc<dyn TrafficSource>,
    clock: Arc<dyn Clock>,
    /// None until the first successful reading
    baseline: Option<Baseline>,
    /// Bytes moved since the last report
    total_bytes: u64,
}

impl RateSampler {
    /// Create a sampler primed with the current counters
    pub fn new(source: Arc<dyn TrafficSource>, clock: Arc<dyn Clock>) -> Self {
        let mut sampler = Self {
            source,
            clock,
            baseline: None,
            total_bytes: 0,
        };
        sampler.prime();
        sampler
    }

    fn prime(&mut self) {
        match self.source.read() {
            Ok(counters) => {
                self.baseline = Some(Baseline {
                    counters,
                    time_ms: self.clock.now_ms(),
                });
            }
            Err(e) => debug!("Traffic counters unavailable at startup: {}", e),
        }
    }

    /// Measure throughput since the previous tick.
    ///
    /// Never fails: an unavailable reading yields a zero sample and leaves
    /// the baseline untouched, so the next good reading spans both intervals.
    pub fn tick(&mut self) -> SpeedSample {
        let counters = match self.source.read() {
            Ok(counters) => counters,
            Err(e) => {
                if e.is_transient() {
                    debug!("Skipping tick, traffic counters unavailable: {}", e);
                } else {
                    warn!("Skipping tick, unexpected counter failure: {}", e);
                }
                return SpeedSample::NONE;
            }
        };
        let now = self.clock.now_ms();

        let previous = self.baseline.replace(Baseline {
            counters,
            time_ms: now,
        });
        let Some(previous) = previous else {
            debug!("Traffic counters available, baseline primed");
            return SpeedSample::NONE;
        };

        let bytes = counters.delta_since(&previous.counters);
        let elapsed_ms = now.saturating_sub(previous.time_ms);
        self.total_bytes = self.total_bytes.saturating_add(bytes);

        trace!(bytes, elapsed_ms, "Sampled traffic");

        let bytes_per_ms = if elapsed_ms > 0 {
            bytes as f64 / elapsed_ms as f64
        } else {
            0.0
        };

        SpeedSample {
            bytes_per_ms,
            bytes,
            elapsed_ms,
        }
    }

    /// Bytes moved since the last report
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Return the running total and start a new one
    pub fn take_total_bytes(&mut self) -> u64 {
        std::mem::take(&mut self.total_bytes)
    }

    pub fn is_primed(&self) -> bool {
        self.baseline.is_some()
    }
}
