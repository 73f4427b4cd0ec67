use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Host-level settings, stored as JSON under the user config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for webhook secret storage; `None` means the
    /// conventional per-user config location.
    pub credentials_dir: Option<PathBuf>,
    /// Per-call budget for webhook requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials_dir: None,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn load() -> AppResult<Self> {
        let path = settings_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Failed to parse settings file: {}. Using defaults.", e);
            Self::default()
        });

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self) -> AppResult<()> {
        self.validate()?;

        let path = settings_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;

        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(AppError::validation(
                "request_timeout_secs",
                "Must be between 1 and 300",
            ));
        }
        Ok(())
    }
}

fn settings_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("discord-webhook-nodes");
    Ok(config_dir.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(settings.credentials_dir.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"credentials_dir": "/tmp/hooks"}"#).unwrap();
        assert_eq!(settings.credentials_dir, Some(PathBuf::from("/tmp/hooks")));
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings {
            credentials_dir: Some(PathBuf::from("/srv/nodes")),
            request_timeout_secs: 60,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let reloaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.credentials_dir, settings.credentials_dir);
        assert_eq!(reloaded.request_timeout_secs, 60);
    }
}
