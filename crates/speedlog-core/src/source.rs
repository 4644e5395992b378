//! Environment collaborators: cumulative traffic counters and the clock

use crate::error::SpeedLogError;
use speedlog_types::{MonitorSettings, TrafficCounters};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of cumulative received/transmitted byte counts
pub trait TrafficSource: Send + Sync {
    fn read(&self) -> Result<TrafficCounters, SpeedLogError>;
}

/// Clock abstraction (epoch milliseconds)
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// `Clock` implementation backed by `SystemTime`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Linux interface counters from `/proc/net/dev`
#[derive(Debug, Clone)]
pub struct ProcNetDev {
    path: PathBuf,
    exclude: Vec<String>,
}

impl ProcNetDev {
    pub fn new(path: impl Into<PathBuf>, exclude: Vec<String>) -> Self {
        Self {
            path: path.into(),
            exclude,
        }
    }

    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(
            settings.counters_path.clone(),
            settings.exclude_interfaces.clone(),
        )
    }
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

impl TrafficSource for ProcNetDev {
    fn read(&self) -> Result<TrafficCounters, SpeedLogError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_proc_net_dev(&content, &self.exclude)
    }
}

/// Sum receive and transmit bytes over every interface not in `exclude`.
///
/// Each data line looks like `  eth0: <rx bytes> <7 more rx fields> <tx bytes> ...`;
/// the two header lines carry no `:` and are skipped.
pub fn parse_proc_net_dev(
    content: &str,
    exclude: &[String],
) -> Result<TrafficCounters, SpeedLogError> {
    let mut totals = TrafficCounters::default();

    for line in content.lines() {
        let Some((name, fields)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if exclude.iter().any(|e| e == name) {
            continue;
        }

        let fields: Vec<&str> = fields.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(SpeedLogError::Counters(format!(
                "interface {} has {} fields, expected at least 9",
                name,
                fields.len()
            )));
        }

        let rx = parse_field(name, fields[0])?;
        let tx = parse_field(name, fields[8])?;
        totals.rx_bytes = totals.rx_bytes.saturating_add(rx);
        totals.tx_bytes = totals.tx_bytes.saturating_add(tx);
    }

    Ok(totals)
}

fn parse_field(interface: &str, value: &str) -> Result<u64, SpeedLogError> {
    value.parse().map_err(|_| {
        SpeedLogError::Counters(format!("interface {}: bad counter {:?}", interface, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  900000    1000    0    0    0     0          0         0   900000    1000    0    0    0     0       0          0
  eth0: 1500000    2000    0    0    0     0          0         0   250000    1800    0    0    0     0       0          0
 wlan0:   40000     300    0    0    0     0          0         0     6000     120    0    0    0     0       0          0
";

    #[test]
    fn test_parse_skips_loopback() {
        let counters = parse_proc_net_dev(SAMPLE, &["lo".to_string()]).unwrap();
        assert_eq!(counters, TrafficCounters::new(1_540_000, 256_000));
    }

    #[test]
    fn test_parse_without_exclusions() {
        let counters = parse_proc_net_dev(SAMPLE, &[]).unwrap();
        assert_eq!(counters, TrafficCounters::new(2_440_000, 1_156_000));
    }

    #[test]
    fn test_parse_rejects_truncated_line() {
        let err = parse_proc_net_dev("eth0: 1 2 3\n", &[]).unwrap_err();
        assert!(matches!(err, SpeedLogError::Counters(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric_counter() {
        let line = "eth0: abc 0 0 0 0 0 0 0 10 0 0 0 0 0 0 0\n";
        assert!(parse_proc_net_dev(line, &[]).is_err());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = ProcNetDev::new(file.path(), vec!["lo".to_string(), "wlan0".to_string()]);
        assert_eq!(source.read().unwrap(), TrafficCounters::new(1_500_000, 250_000));
    }

    #[test]
    fn test_missing_file_is_transient() {
        let source = ProcNetDev::new("/nonexistent/speedlog/net/dev", Vec::new());
        let err = source.read().unwrap_err();
        assert!(err.is_transient());
    }
}
