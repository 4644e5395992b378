//! Scripted collaborators for unit tests

use crate::error::SpeedLogError;
use crate::source::{Clock, TrafficSource};
use parking_lot::Mutex;
use speedlog_types::TrafficCounters;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Replays queued readings; repeats the last good one once the script runs out
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<TrafficCounters>>>,
    last: Mutex<Option<TrafficCounters>>,
}

impl ScriptedSource {
    pub fn new(readings: impl IntoIterator<Item = Option<TrafficCounters>>) -> Self {
        Self {
            script: Mutex::new(readings.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

impl TrafficSource for ScriptedSource {
    fn read(&self) -> Result<TrafficCounters, SpeedLogError> {
        let next = self.script.lock().pop_front();
        let reading = match next {
            Some(reading) => reading,
            None => *self.last.lock(),
        };
        match reading {
            Some(counters) => {
                *self.last.lock() = Some(counters);
                Ok(counters)
            }
            None => Err(SpeedLogError::Counters("scripted outage".to_string())),
        }
    }
}

/// Clock that only moves when told to
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self {
            now: AtomicU64::new(ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Counters that grow by a fixed step on every read
pub struct SteadySource {
    step: u64,
    rx: AtomicU64,
}

impl SteadySource {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            rx: AtomicU64::new(0),
        }
    }
}

impl TrafficSource for SteadySource {
    fn read(&self) -> Result<TrafficCounters, SpeedLogError> {
        let rx = self.rx.fetch_add(self.step, Ordering::SeqCst) + self.step;
        Ok(TrafficCounters::new(rx, 0))
    }
}

/// Clock following tokio's (pausable) time
pub struct TokioClock {
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
