//! Engine smoothing parameters and their resolution.
//!
//! The two tunables live in one place so the documented defaults
//! `{ema_alpha: 0.35, snooze_factor: 0.2}` are never scattered across
//! call sites: every consumer goes through [`EngineSettings::resolve`].

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

fn default_ema_alpha() -> f64 {
    0.35
}

fn default_snooze_factor() -> f64 {
    0.2
}

/// User-tunable parameters of the recalculation engine.
///
/// Both values must lie strictly between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// EMA smoothing factor: weight given to the most recent observed
    /// watering interval.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,

    /// Fraction of the current interval a default snooze defers by.
    #[serde(default = "default_snooze_factor")]
    pub snooze_factor: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ema_alpha: default_ema_alpha(),
            snooze_factor: default_snooze_factor(),
        }
    }
}

/// Optional per-user overrides, merged over the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    pub ema_alpha: Option<f64>,
    pub snooze_factor: Option<f64>,
}

impl EngineSettings {
    /// Merge user overrides over the documented defaults.
    pub fn resolve(overrides: &SettingsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            ema_alpha: overrides.ema_alpha.unwrap_or(defaults.ema_alpha),
            snooze_factor: overrides.snooze_factor.unwrap_or(defaults.snooze_factor),
        }
    }

    /// Reject parameters that would make the EMA produce NaN or
    /// negative intervals.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidSetting`] if either value is not
    /// strictly between 0 and 1.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha < 1.0) {
            return Err(EngineError::InvalidSetting {
                field: "ema_alpha",
                value: self.ema_alpha,
            });
        }
        if !(self.snooze_factor > 0.0 && self.snooze_factor < 1.0) {
            return Err(EngineError::InvalidSetting {
                field: "snooze_factor",
                value: self.snooze_factor,
            });
        }
        Ok(())
    }
}
