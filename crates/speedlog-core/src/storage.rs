//! Storage layer for persistent settings (JSON file in the data directory)

use crate::error::SpeedLogError;
use speedlog_types::MonitorSettings;
use std::path::{Path, PathBuf};
use tokio::fs;

const SETTINGS_FILE: &str = "settings.json";

/// Storage manager for SpeedLog data
#[derive(Clone, Debug)]
pub struct Storage {
    /// Data directory
    data_dir: PathBuf,
}

impl Storage {
    /// Create a new storage instance
    pub async fn new(data_dir: PathBuf) -> Result<Self, SpeedLogError> {
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Load settings, falling back to defaults when none were saved
    pub async fn load_settings(&self) -> Result<MonitorSettings, SpeedLogError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(MonitorSettings::default());
        }

        let content = fs::read_to_string(&path).await?;
        let settings = serde_json::from_str(&content)?;
        validate(&settings)?;
        Ok(settings)
    }

    /// Save settings
    pub async fn save_settings(&self, settings: &MonitorSettings) -> Result<(), SpeedLogError> {
        validate(settings)?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(self.settings_path(), content).await?;
        Ok(())
    }

    /// Remove saved settings so defaults apply again
    pub async fn reset_settings(&self) -> Result<(), SpeedLogError> {
        let path = self.settings_path();
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

fn validate(settings: &MonitorSettings) -> Result<(), SpeedLogError> {
    if settings.interval_ms == 0 {
        return Err(SpeedLogError::InvalidSettings(
            "interval_ms must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
