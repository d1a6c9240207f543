//! Adaptive watering-schedule recalculation.
//!
//! The engine folds a plant's full event history into three derived
//! fields: the smoothed interval estimate, the last-watered timestamp,
//! and the next-check timestamp. It is a pure function: every mutation
//! of the event log (append, delete, settings change) replays the whole
//! history from scratch, so repeated recalculation can never drift.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{Event, EventKind, SoilCondition};
use crate::settings::EngineSettings;

/// Scale applied to the next-check projection when the soil was found
/// dry at watering time. The scaled value never feeds back into the
/// learned interval.
pub const DRY_SOIL_SCALE: f64 = 0.8;

/// Floor for a computed snooze, so fast-cycling plants never get a
/// degenerate near-zero deferral.
pub const MIN_SNOOZE_DAYS: i64 = 2;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Output of a recalculation: the three engine-owned plant fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedState {
    /// Smoothed watering interval in days, always positive.
    pub current_interval: f64,
    pub last_watered_at: Option<DateTime<Utc>>,
    pub next_check_at: DateTime<Utc>,
}

/// Real-valued day count between two instants. Fractional days matter:
/// a watering 36 hours after the last one is an observation of 1.5, not 1.
fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MS_PER_DAY
}

/// `at` shifted forward by a real-valued number of days.
fn days_after(at: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    at + Duration::milliseconds((days * MS_PER_DAY).round() as i64)
}

/// Replay a plant's ordered event history into its derived state.
///
/// `events` must be sorted ascending by `(at, id)`; the engine rejects
/// out-of-order input instead of silently sorting it. An empty history
/// yields `next_check_at = now` so a brand-new plant is due immediately
/// rather than at its (possibly backdated) creation time.
///
/// # Errors
/// Returns [`EngineError`] when settings are outside (0, 1), the default
/// interval is not positive, or the history is out of order.
pub fn recompute_at(
    created_at: DateTime<Utc>,
    default_interval: f64,
    events: &[Event],
    settings: &EngineSettings,
    now: DateTime<Utc>,
) -> Result<DerivedState, EngineError> {
    settings.validate()?;
    if !(default_interval > 0.0) {
        return Err(EngineError::NonPositiveInterval(default_interval));
    }
    if let Some(pair) = events
        .windows(2)
        .find(|pair| (pair[1].at, pair[1].id) < (pair[0].at, pair[0].id))
    {
        return Err(EngineError::OutOfOrderEvents {
            event_id: pair[1].id,
        });
    }

    let mut state = DerivedState {
        current_interval: default_interval,
        last_watered_at: None,
        next_check_at: created_at,
    };

    for event in events {
        match event.kind {
            EventKind::Water => {
                // First watering and anomalies set the anchor without
                // touching the learned interval.
                if let Some(last) = state.last_watered_at {
                    if !event.is_anomaly {
                        let observed = days_between(last, event.at);
                        state.current_interval = settings.ema_alpha * observed
                            + (1.0 - settings.ema_alpha) * state.current_interval;
                    }
                }
                state.last_watered_at = Some(event.at);

                let mut projected = state.current_interval;
                if event.soil_condition == Some(SoilCondition::Dry) {
                    projected *= DRY_SOIL_SCALE;
                }
                state.next_check_at = days_after(event.at, projected);
            }
            EventKind::Snooze => {
                let days = match event.snooze_extra_days {
                    Some(d) if d > 0 => d,
                    _ => ((state.current_interval * settings.snooze_factor).floor() as i64)
                        .max(MIN_SNOOZE_DAYS),
                };
                state.next_check_at = event.at + Duration::days(days);
            }
            EventKind::Repot => {
                // Repotting invalidates the learned rhythm entirely and
                // forces a fresh observation cycle.
                state.current_interval = default_interval;
                state.next_check_at = event.at;
            }
        }
    }

    if events.is_empty() {
        state.next_check_at = now;
    }

    Ok(state)
}

/// [`recompute_at`] anchored to the wall clock.
pub fn recompute(
    created_at: DateTime<Utc>,
    default_interval: f64,
    events: &[Event],
    settings: &EngineSettings,
) -> Result<DerivedState, EngineError> {
    recompute_at(created_at, default_interval, events, settings, Utc::now())
}

/// Direct-write escape hatch for a manual interval edit.
///
/// Shifts `next_check_at` from the same anchor the replay would use:
/// the last watering, or creation time if the plant was never watered.
///
/// # Errors
/// Returns [`EngineError::NonPositiveInterval`] for a non-positive value.
pub fn manual_interval(
    created_at: DateTime<Utc>,
    last_watered_at: Option<DateTime<Utc>>,
    new_interval: f64,
) -> Result<DerivedState, EngineError> {
    if !(new_interval > 0.0) {
        return Err(EngineError::NonPositiveInterval(new_interval));
    }
    let anchor = last_watered_at.unwrap_or(created_at);
    Ok(DerivedState {
        current_interval: new_interval,
        last_watered_at,
        next_check_at: days_after(anchor, new_interval),
    })
}
