//! Shared types for SpeedLog
//!
//! This crate contains the data structures shared between the
//! sampling engine and the command-line front end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Sampling Types
// ============================================================================

/// Cumulative byte counters as reported by the host since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl TrafficCounters {
    pub fn new(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self { rx_bytes, tx_bytes }
    }

    /// Bytes moved between `earlier` and `self` in both directions.
    /// A counter that went backwards contributes nothing.
    pub fn delta_since(&self, earlier: &TrafficCounters) -> u64 {
        let rx = self.rx_bytes.saturating_sub(earlier.rx_bytes);
        let tx = self.tx_bytes.saturating_sub(earlier.tx_bytes);
        rx.saturating_add(tx)
    }
}

/// Instantaneous throughput measured over one sampling interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// Bytes per millisecond (roughly KB/s)
    pub bytes_per_ms: f64,
    /// Bytes moved during the interval
    pub bytes: u64,
    /// Interval length in milliseconds
    pub elapsed_ms: u64,
}

impl SpeedSample {
    pub const NONE: SpeedSample = SpeedSample {
        bytes_per_ms: 0.0,
        bytes: 0,
        elapsed_ms: 0,
    };

    /// Whether the sample carries a transfer worth classifying
    pub fn has_signal(&self) -> bool {
        self.bytes_per_ms > 0.0
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// Accumulated speed log since the previous report.
///
/// Serialized in the shape the scripting bridge expects:
/// `{"totalKBdownloaded": 12, "distributionInKBPS": {"32": 3, "4096": 1}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLog {
    /// Written as `totalKBdownloaded` (lower-case `d`), the key existing
    /// bridge consumers read, not the camel-case `totalKBDownloaded`.
    /// Both spellings are accepted when reading a log back.
    #[serde(rename = "totalKBdownloaded", alias = "totalKBDownloaded")]
    pub total_kb_downloaded: u64,
    /// Bucket threshold -> number of samples that landed in it
    #[serde(rename = "distributionInKBPS")]
    pub distribution_in_kbps: BTreeMap<u32, u64>,
}

impl SpeedLog {
    pub fn is_empty(&self) -> bool {
        self.total_kb_downloaded == 0 && self.distribution_in_kbps.is_empty()
    }

    /// Total number of classified samples
    pub fn sample_count(&self) -> u64 {
        self.distribution_in_kbps.values().sum()
    }
}

// ============================================================================
// Settings Types
// ============================================================================

/// Sampler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Delay before the first tick, so the startup burst is not sampled
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    /// Time between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Cumulative counter file (Linux `/proc/net/dev` format)
    #[serde(default = "default_counters_path")]
    pub counters_path: PathBuf,
    /// Interfaces left out of the totals
    #[serde(default = "default_exclude_interfaces")]
    pub exclude_interfaces: Vec<String>,
}

fn default_warmup_ms() -> u64 {
    2000
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_counters_path() -> PathBuf {
    PathBuf::from("/proc/net/dev")
}

fn default_exclude_interfaces() -> Vec<String> {
    vec!["lo".to_string()]
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            interval_ms: default_interval_ms(),
            counters_path: default_counters_path(),
            exclude_interfaces: default_exclude_interfaces(),
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Events emitted by the monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MonitorEvent {
    Sample {
        bytes_per_ms: f64,
        /// Bucket the sample was counted in, if any
        threshold: Option<u32>,
    },
    Reported {
        log: SpeedLog,
    },
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_log_wire_shape() {
        let mut log = SpeedLog {
            total_kb_downloaded: 12,
            ..Default::default()
        };
        log.distribution_in_kbps.insert(4096, 1);
        log.distribution_in_kbps.insert(32, 3);

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalKBdownloaded": 12,
                "distributionInKBPS": { "32": 3, "4096": 1 }
            })
        );
    }

    #[test]
    fn test_speed_log_accepts_camel_case_alias() {
        let log: SpeedLog = serde_json::from_str(
            r#"{"totalKBDownloaded": 5, "distributionInKBPS": {"64": 2}}"#,
        )
        .unwrap();
        assert_eq!(log.total_kb_downloaded, 5);
        assert_eq!(log.distribution_in_kbps.get(&64), Some(&2));
        assert_eq!(log.sample_count(), 2);
    }

    #[test]
    fn test_delta_clamps_counter_resets() {
        let before = TrafficCounters::new(1_000, 500);
        let after = TrafficCounters::new(200, 800);
        assert_eq!(after.delta_since(&before), 300);
    }

    #[test]
    fn test_settings_fill_missing_fields() {
        let settings: MonitorSettings = serde_json::from_str(r#"{"interval_ms": 500}"#).unwrap();
        assert_eq!(settings.interval_ms, 500);
        assert_eq!(settings.warmup_ms, 2000);
        assert_eq!(settings.exclude_interfaces, vec!["lo".to_string()]);
    }
}
