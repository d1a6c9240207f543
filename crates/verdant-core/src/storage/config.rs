//! TOML-based user configuration.
//!
//! Holds the user's engine overrides. Stored at
//! `~/.config/verdant/config.toml`; unset fields fall back to the
//! documented defaults through [`EngineSettings::resolve`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::settings::{EngineSettings, SettingsOverrides};

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/verdant/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User overrides for the engine settings.
    #[serde(default)]
    pub engine: SettingsOverrides,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Effective engine settings: overrides merged over defaults.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::resolve(&self.engine)
    }

    /// Get an effective value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let settings = self.engine_settings();
        match key {
            "ema_alpha" => Some(settings.ema_alpha.to_string()),
            "snooze_factor" => Some(settings.snooze_factor.to_string()),
            _ => None,
        }
    }

    /// Set an override by key, validating the resolved settings before
    /// saving.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed, falls outside (0, 1), or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let parsed: f64 = value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as a number"),
        })?;

        let mut candidate = self.engine;
        match key {
            "ema_alpha" => candidate.ema_alpha = Some(parsed),
            "snooze_factor" => candidate.snooze_factor = Some(parsed),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        EngineSettings::resolve(&candidate)
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.engine = candidate;
        self.save()
    }
}
