//! Speed Monitor - periodic sampling task
//!
//! Owns the guarded `SpeedLogState` and a cancellable background task that
//! ticks it on a fixed cadence. Reports are taken under the same lock as
//! ticks, so a report never sees half a tick.

use super::{BucketAggregator, BucketTable, RateSampler, SpeedLogState, TickOutcome};
use crate::error::SpeedLogError;
use crate::source::{Clock, ProcNetDev, SystemClock, TrafficSource};
use parking_lot::Mutex;
use speedlog_types::{MonitorEvent, MonitorSettings, SpeedLog};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle to the running sampling task
struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct MonitorInner {
    state: Arc<Mutex<SpeedLogState>>,
    warmup: Duration,
    interval: Duration,
    event_tx: broadcast::Sender<MonitorEvent>,
    task: Mutex<Option<MonitorTask>>,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

/// Throughput monitor. Cheap to clone; all clones share one state and task.
#[derive(Clone)]
pub struct SpeedMonitor {
    inner: Arc<MonitorInner>,
}

impl SpeedMonitor {
    /// Create a monitor over the given collaborators
    pub fn new(
        source: Arc<dyn TrafficSource>,
        clock: Arc<dyn Clock>,
        settings: &MonitorSettings,
    ) -> Result<Self, SpeedLogError> {
        if settings.interval_ms == 0 {
            return Err(SpeedLogError::InvalidSettings(
                "interval_ms must be greater than zero".to_string(),
            ));
        }

        let sampler = RateSampler::new(source, clock);
        let aggregator = BucketAggregator::new(BucketTable::standard());
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                state: Arc::new(Mutex::new(SpeedLogState::new(sampler, aggregator))),
                warmup: Duration::from_millis(settings.warmup_ms),
                interval: Duration::from_millis(settings.interval_ms),
                event_tx,
                task: Mutex::new(None),
            }),
        })
    }

    /// Create a monitor reading the host's interface counters
    pub fn from_settings(settings: &MonitorSettings) -> Result<Self, SpeedLogError> {
        Self::new(
            Arc::new(ProcNetDev::from_settings(settings)),
            Arc::new(SystemClock),
            settings,
        )
    }

    /// Subscribe to monitor events
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.task.lock().is_some()
    }

    /// Start the background sampling task. Must be called from within a
    /// tokio runtime. Starting a running monitor does nothing.
    pub fn start(&self) {
        let mut task = self.inner.task.lock();
        if task.is_some() {
            info!("Speed monitor already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sampling_loop(
            self.inner.state.clone(),
            self.inner.event_tx.clone(),
            self.inner.warmup,
            self.inner.interval,
            cancel.clone(),
        ));

        info!(
            warmup_ms = self.inner.warmup.as_millis() as u64,
            interval_ms = self.inner.interval.as_millis() as u64,
            "Starting speed monitor"
        );
        *task = Some(MonitorTask { cancel, handle });
    }

    /// Stop the sampling task. No tick runs after this returns.
    pub async fn stop(&self) {
        let task = self.inner.task.lock().take();
        let Some(task) = task else {
            return;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!("Speed monitor task ended abnormally: {}", e);
        }
        let _ = self.inner.event_tx.send(MonitorEvent::Stopped);
    }

    /// Run one tick immediately, outside the schedule
    pub fn tick_now(&self) -> TickOutcome {
        let outcome = self.inner.state.lock().record_tick();
        emit_sample(&self.inner.event_tx, &outcome);
        outcome
    }

    /// Take the speed log accumulated since the previous call
    pub fn fetch_speed_log(&self) -> SpeedLog {
        let log = self.inner.state.lock().report_and_reset();
        debug!(
            total_kb = log.total_kb_downloaded,
            samples = log.sample_count(),
            "Speed log reported"
        );
        let _ = self
            .inner
            .event_tx
            .send(MonitorEvent::Reported { log: log.clone() });
        log
    }

    /// Take the speed log in its wire shape.
    ///
    /// The state is cleared before serialization, so a failed report is
    /// dropped rather than carried into the next one.
    pub fn fetch_speed_log_json(&self) -> Result<serde_json::Value, SpeedLogError> {
        let log = self.fetch_speed_log();
        serde_json::to_value(&log).map_err(|e| {
            warn!("Failed to serialize speed log: {}", e);
            SpeedLogError::from(e)
        })
    }

    /// Current accumulation without resetting it
    pub fn peek(&self) -> SpeedLog {
        self.inner.state.lock().peek()
    }
}

async fn run_sampling_loop(
    state: Arc<Mutex<SpeedLogState>>,
    event_tx: broadcast::Sender<MonitorEvent>,
    warmup: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            info!("Speed monitor stopped during warm-up");
            return;
        }
        _ = tokio::time::sleep(warmup) => {}
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let outcome = state.lock().record_tick();
                emit_sample(&event_tx, &outcome);
            }
        }
    }

    info!("Speed monitor stopped");
}

fn emit_sample(event_tx: &broadcast::Sender<MonitorEvent>, outcome: &TickOutcome) {
    if outcome.sample.has_signal() {
        let _ = event_tx.send(MonitorEvent::Sample {
            bytes_per_ms: outcome.sample.bytes_per_ms,
            threshold: outcome.threshold,
        });
    }
}
