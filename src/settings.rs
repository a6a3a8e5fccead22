use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::DispatchError;

pub const DEFAULT_INTERVAL_MS: u64 = 300;

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// How long a trampoline waits for the second press, unless the
    /// binding names its own interval.
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,

    #[serde(skip)]
    file_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::ephemeral()
    }
}

impl Settings {
    pub fn ephemeral() -> Self {
        Self {
            default_interval_ms: DEFAULT_INTERVAL_MS,
            file_path: None,
        }
    }

    pub fn with_file(file_path: &str) -> Self {
        Self {
            default_interval_ms: DEFAULT_INTERVAL_MS,
            file_path: Some(file_path.to_string()),
        }
    }

    pub fn load_or_default(file_path: Option<&str>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load settings from {path}: {e}");
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Ok(Self::with_file(file_path));
        }

        let content = fs::read_to_string(path)?;
        let mut settings = match serde_json::from_str::<Self>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to parse settings file: {e}");
                return Err(anyhow::anyhow!("Failed to parse settings: {}", e));
            }
        };
        settings.default_interval()?;
        settings.file_path = Some(file_path.to_string());
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        match &self.file_path {
            Some(path) => {
                let content = serde_json::to_string_pretty(self)?;
                fs::write(path, content)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn default_interval(&self) -> Result<Duration, DispatchError> {
        let interval = Duration::from_millis(self.default_interval_ms);
        if interval.is_zero() {
            return Err(DispatchError::InvalidInterval(interval));
        }
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.default_interval().unwrap(), Duration::from_millis(300));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let path = path.to_str().unwrap();

        let mut settings = Settings::with_file(path);
        settings.default_interval_ms = 450;
        settings.save().unwrap();

        let loaded = Settings::load_from_file(path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.default_interval().unwrap(), Duration::from_millis(450));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"default_interval_ms": 0}"#).unwrap();

        let err = Settings::load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::InvalidInterval(_))
        ));

        let fallback = Settings::load_or_default(path.to_str());
        assert_eq!(fallback.default_interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn test_garbage_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(Settings::load_from_file(path.to_str().unwrap()).is_err());
        let fallback = Settings::load_or_default(path.to_str());
        assert_eq!(fallback.default_interval_ms, DEFAULT_INTERVAL_MS);
    }
}
