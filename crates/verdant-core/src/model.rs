//! Domain types: archetypes, rooms, plants, and the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the reserved room holding soft-deleted plants.
pub const GRAVEYARD_ROOM: &str = "Graveyard";

/// Name of the fallback room plants move to when their room is deleted.
pub const DEFAULT_ROOM: &str = "Default";

/// Static reference data: a plant-type template.
///
/// The default interval seeds a plant's learned rhythm at creation and
/// again after every repot. Archetypes are immutable after seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: i64,
    pub name: String,
    /// Seed watering interval in days.
    pub default_interval_days: f64,
}

/// An organizational grouping of plants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i64,
}

impl Room {
    pub fn is_graveyard(&self) -> bool {
        self.name == GRAVEYARD_ROOM
    }
}

/// A tracked plant.
///
/// `current_interval`, `last_watered_at` and `next_check_at` are derived
/// fields owned by the recalculation engine; storage writes them only
/// from engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    pub name: String,
    pub room_id: Uuid,
    pub archetype_id: i64,
    /// Optional amount of water given per watering, in milliliters.
    pub water_amount_ml: Option<f64>,
    pub created_at: DateTime<Utc>,
    /// Smoothed watering-interval estimate in days, always positive.
    pub current_interval: f64,
    pub last_watered_at: Option<DateTime<Utc>>,
    pub next_check_at: DateTime<Utc>,
}

impl Plant {
    /// Whether the plant is due for a check at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_check_at <= now
    }
}

/// Kind of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Water,
    Snooze,
    Repot,
}

/// Soil condition observed at watering time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilCondition {
    Normal,
    Dry,
}

/// An immutable, append-only log entry belonging to exactly one plant.
///
/// `id` is the insertion sequence; recalculation orders events by
/// `(at, id)` so equal timestamps replay deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub plant_id: Uuid,
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    /// Watering logged out of rhythm (e.g. backfilled late); must not
    /// feed the learned interval.
    pub is_anomaly: bool,
    pub soil_condition: Option<SoilCondition>,
    pub snooze_extra_days: Option<i64>,
    pub note: Option<String>,
}

/// Payload for appending a new event to a plant's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub kind: EventKind,
    /// Event timestamp; defaults to now when absent.
    pub at: Option<DateTime<Utc>>,
    pub is_anomaly: bool,
    pub soil_condition: Option<SoilCondition>,
    pub snooze_extra_days: Option<i64>,
    pub note: Option<String>,
}

impl NewEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            at: None,
            is_anomaly: false,
            soil_condition: None,
            snooze_extra_days: None,
            note: None,
        }
    }

    pub fn water() -> Self {
        Self::new(EventKind::Water)
    }

    pub fn snooze() -> Self {
        Self::new(EventKind::Snooze)
    }

    pub fn repot() -> Self {
        Self::new(EventKind::Repot)
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = Some(at);
        self
    }

    pub fn anomaly(mut self, is_anomaly: bool) -> Self {
        self.is_anomaly = is_anomaly;
        self
    }

    pub fn soil(mut self, condition: SoilCondition) -> Self {
        self.soil_condition = Some(condition);
        self
    }

    pub fn extra_days(mut self, days: i64) -> Self {
        self.snooze_extra_days = Some(days);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_kind_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&EventKind::Water).unwrap(),
            "\"WATER\""
        );
        assert_eq!(
            serde_json::to_string(&SoilCondition::Dry).unwrap(),
            "\"DRY\""
        );
    }

    #[test]
    fn new_event_builder_sets_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let ev = NewEvent::water()
            .at(at)
            .soil(SoilCondition::Dry)
            .note("ran dry");
        assert_eq!(ev.kind, EventKind::Water);
        assert_eq!(ev.at, Some(at));
        assert_eq!(ev.soil_condition, Some(SoilCondition::Dry));
        assert_eq!(ev.note.as_deref(), Some("ran dry"));
        assert!(!ev.is_anomaly);
    }

    #[test]
    fn plant_due_comparison_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let plant = Plant {
            id: Uuid::new_v4(),
            name: "Monstera".into(),
            room_id: Uuid::new_v4(),
            archetype_id: 3,
            water_amount_ml: None,
            created_at: now,
            current_interval: 7.0,
            last_watered_at: None,
            next_check_at: now,
        };
        assert!(plant.is_due(now));
        assert!(!plant.is_due(now - chrono::Duration::seconds(1)));
    }
}
