use speedlog_core::{Bridge, Clock, SpeedLogError, SpeedMonitor, TrafficSource};
use speedlog_types::{MonitorSettings, TrafficCounters};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Adds `step` received bytes per read
struct Counting {
    step: u64,
    rx: AtomicU64,
}

impl TrafficSource for Counting {
    fn read(&self) -> Result<TrafficCounters, SpeedLogError> {
        let rx = self.rx.fetch_add(self.step, Ordering::SeqCst) + self.step;
        Ok(TrafficCounters::new(rx, 0))
    }
}

/// Moves one second forward on every read
struct Stepping(AtomicU64);

impl Clock for Stepping {
    fn now_ms(&self) -> u64 {
        self.0.fetch_add(1_000, Ordering::SeqCst) + 1_000
    }
}

fn monitor(step: u64) -> SpeedMonitor {
    SpeedMonitor::new(
        Arc::new(Counting {
            step,
            rx: AtomicU64::new(0),
        }),
        Arc::new(Stepping(AtomicU64::new(0))),
        &MonitorSettings::default(),
    )
    .unwrap()
}

#[test]
fn reports_never_lose_or_double_count_ticks() {
    let monitor = monitor(100_000);
    let ticks_per_thread = 500;

    let tickers: Vec<_> = (0..4)
        .map(|_| {
            let monitor = monitor.clone();
            thread::spawn(move || {
                for _ in 0..ticks_per_thread {
                    monitor.tick_now();
                }
            })
        })
        .collect();

    let reporter = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut samples = 0;
            for _ in 0..200 {
                samples += monitor.fetch_speed_log().sample_count();
                thread::yield_now();
            }
            samples
        })
    };

    for ticker in tickers {
        ticker.join().unwrap();
    }
    let mut samples = reporter.join().unwrap();
    samples += monitor.fetch_speed_log().sample_count();

    assert_eq!(samples, 4 * ticks_per_thread);
}

#[test]
fn bridge_serves_speed_log_in_wire_shape() {
    let bridge = Bridge::new(monitor(5_000_000));
    bridge.monitor().tick_now();
    bridge.monitor().tick_now();

    let log = bridge
        .execute("fetchSpeedLog", &serde_json::Value::Null)
        .unwrap();
    assert_eq!(
        log,
        serde_json::json!({
            "totalKBdownloaded": 10_000_000 / 1024,
            "distributionInKBPS": { "4096": 2 }
        })
    );
}
