//! Action bridge for the host's scripting layer
//!
//! Routes named actions to handlers and answers with JSON. Only the speed
//! log is served here; download-queue actions belong to the OS download
//! service and are reported as unsupported.

use crate::engine::SpeedMonitor;
use crate::error::SpeedLogError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Actions the scripting layer may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Enqueue,
    Query,
    Remove,
    AddCompletedDownload,
    FetchSpeedLog,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Enqueue => "enqueue",
            Action::Query => "query",
            Action::Remove => "remove",
            Action::AddCompletedDownload => "addCompletedDownload",
            Action::FetchSpeedLog => "fetchSpeedLog",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = SpeedLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueue" => Ok(Action::Enqueue),
            "query" => Ok(Action::Query),
            "remove" => Ok(Action::Remove),
            "addCompletedDownload" => Ok(Action::AddCompletedDownload),
            "fetchSpeedLog" => Ok(Action::FetchSpeedLog),
            _ => Err(SpeedLogError::InvalidAction(s.to_string())),
        }
    }
}

/// Dispatches actions against a `SpeedMonitor`
#[derive(Clone)]
pub struct Bridge {
    monitor: SpeedMonitor,
}

impl Bridge {
    pub fn new(monitor: SpeedMonitor) -> Self {
        Self { monitor }
    }

    pub fn monitor(&self) -> &SpeedMonitor {
        &self.monitor
    }

    /// Execute a named action. `args` is passed through for actions that
    /// take arguments; `fetchSpeedLog` ignores it.
    pub fn execute(&self, action: &str, args: &Value) -> Result<Value, SpeedLogError> {
        let action: Action = action.parse()?;
        debug!(%action, %args, "Executing bridge action");

        match action {
            Action::FetchSpeedLog => self.monitor.fetch_speed_log_json(),
            Action::Enqueue | Action::Query | Action::Remove | Action::AddCompletedDownload => {
                Err(SpeedLogError::Unsupported(action.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, ScriptedSource};
    use speedlog_types::{MonitorSettings, TrafficCounters};
    use std::sync::Arc;

    fn bridge() -> (Bridge, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(0));
        let source = Arc::new(ScriptedSource::new([
            Some(TrafficCounters::new(0, 0)),
            Some(TrafficCounters::new(2_000_000, 1_072_000)),
        ]));
        let monitor = SpeedMonitor::new(source, clock.clone(), &MonitorSettings::default()).unwrap();
        (Bridge::new(monitor), clock)
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in [
            Action::Enqueue,
            Action::Query,
            Action::Remove,
            Action::AddCompletedDownload,
            Action::FetchSpeedLog,
        ] {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_fetch_speed_log_resets() {
        let (bridge, clock) = bridge();
        clock.advance(1_000);
        bridge.monitor().tick_now();

        let log = bridge.execute("fetchSpeedLog", &Value::Null).unwrap();
        assert_eq!(log["totalKBdownloaded"], 3_000);
        assert_eq!(log["distributionInKBPS"]["3072"], 1);

        let log = bridge.execute("fetchSpeedLog", &Value::Null).unwrap();
        assert_eq!(log["totalKBdownloaded"], 0);
        assert_eq!(log["distributionInKBPS"], serde_json::json!({}));
    }

    #[test]
    fn test_download_queue_actions_unsupported() {
        let (bridge, _) = bridge();
        let err = bridge
            .execute("enqueue", &serde_json::json!([{"uri": "https://example.com/a.zip"}]))
            .unwrap_err();
        assert!(matches!(err, SpeedLogError::Unsupported(name) if name == "enqueue"));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let (bridge, _) = bridge();
        let err = bridge.execute("fetchSpeedLogs", &Value::Null).unwrap_err();
        assert!(matches!(err, SpeedLogError::InvalidAction(_)));
        assert_eq!(String::from(err), "Invalid action: fetchSpeedLogs");
    }
}
