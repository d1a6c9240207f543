//! SQLite-based storage for archetypes, rooms, plants, and the event log.
//!
//! Every mutation of a plant's event log runs the read-compute-write
//! sequence inside one transaction, under that plant's lock: load the
//! full ordered history, replay it through the engine, and persist the
//! derived fields. The derived columns are written from engine output
//! only, and only when the replay succeeds.

use chrono::{DateTime, Utc};
use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::engine::{self, DerivedState};
use crate::error::DatabaseError;
use crate::locks::PlantLocks;
use crate::model::{
    Archetype, Event, EventKind, NewEvent, Plant, Room, SoilCondition, DEFAULT_ROOM,
    GRAVEYARD_ROOM,
};
use crate::settings::EngineSettings;

/// Archetypes installed on first open.
const SEED_ARCHETYPES: [(i64, &str, f64); 5] = [
    (1, "Fern", 5.0),
    (2, "Succulent", 21.0),
    (3, "Aroid", 7.0),
    (4, "Cactus", 30.0),
    (5, "Tropical", 10.0),
];

// === Helper Functions ===

fn conversion_err(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

/// Format event kind for database storage
fn format_event_kind(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Water => "WATER",
        EventKind::Snooze => "SNOOZE",
        EventKind::Repot => "REPOT",
    }
}

/// Parse event kind from database string
fn parse_event_kind(kind_str: &str) -> Result<EventKind, rusqlite::Error> {
    match kind_str {
        "WATER" => Ok(EventKind::Water),
        "SNOOZE" => Ok(EventKind::Snooze),
        "REPOT" => Ok(EventKind::Repot),
        other => Err(conversion_err(format!("unknown event kind '{other}'"))),
    }
}

/// Format soil condition for database storage
fn format_soil_condition(condition: Option<SoilCondition>) -> Option<&'static str> {
    condition.map(|c| match c {
        SoilCondition::Normal => "NORMAL",
        SoilCondition::Dry => "DRY",
    })
}

/// Parse soil condition from database string
fn parse_soil_condition(soil_str: Option<&str>) -> Result<Option<SoilCondition>, rusqlite::Error> {
    match soil_str {
        None => Ok(None),
        Some("NORMAL") => Ok(Some(SoilCondition::Normal)),
        Some("DRY") => Ok(Some(SoilCondition::Dry)),
        Some(other) => Err(conversion_err(format!("unknown soil condition '{other}'"))),
    }
}

/// Parse datetime from RFC3339 string
fn parse_datetime(dt_str: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(format!("bad timestamp '{dt_str}': {e}")))
}

/// Parse uuid from database string
fn parse_uuid(id_str: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(id_str).map_err(|e| conversion_err(format!("bad uuid '{id_str}': {e}")))
}

/// Build a Room from a database row (id, name, sort_order)
fn row_to_room(row: &rusqlite::Row) -> Result<Room, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    Ok(Room {
        id: parse_uuid(&id_str)?,
        name: row.get(1)?,
        sort_order: row.get(2)?,
    })
}

/// Build a Plant from a database row in column order
/// (id, name, room_id, archetype_id, water_amount_ml, created_at,
///  current_interval, last_watered_at, next_check_at)
fn row_to_plant(row: &rusqlite::Row) -> Result<Plant, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let room_str: String = row.get(2)?;
    let created_str: String = row.get(5)?;
    let last_watered_str: Option<String> = row.get(7)?;
    let next_check_str: String = row.get(8)?;
    Ok(Plant {
        id: parse_uuid(&id_str)?,
        name: row.get(1)?,
        room_id: parse_uuid(&room_str)?,
        archetype_id: row.get(3)?,
        water_amount_ml: row.get(4)?,
        created_at: parse_datetime(&created_str)?,
        current_interval: row.get(6)?,
        last_watered_at: last_watered_str.as_deref().map(parse_datetime).transpose()?,
        next_check_at: parse_datetime(&next_check_str)?,
    })
}

/// Build an Event from a database row in column order
/// (id, plant_id, kind, at, is_anomaly, soil_condition,
///  snooze_extra_days, note)
fn row_to_event(row: &rusqlite::Row) -> Result<Event, rusqlite::Error> {
    let plant_str: String = row.get(1)?;
    let kind_str: String = row.get(2)?;
    let at_str: String = row.get(3)?;
    let soil_str: Option<String> = row.get(5)?;
    Ok(Event {
        id: row.get(0)?,
        plant_id: parse_uuid(&plant_str)?,
        kind: parse_event_kind(&kind_str)?,
        at: parse_datetime(&at_str)?,
        is_anomaly: row.get(4)?,
        soil_condition: parse_soil_condition(soil_str.as_deref())?,
        snooze_extra_days: row.get(6)?,
        note: row.get(7)?,
    })
}

const PLANT_COLUMNS: &str = "id, name, room_id, archetype_id, water_amount_ml, created_at, \
                             current_interval, last_watered_at, next_check_at";
const EVENT_COLUMNS: &str =
    "id, plant_id, kind, at, is_anomaly, soil_condition, snooze_extra_days, note";

fn fetch_plant(conn: &Connection, plant_id: Uuid) -> Result<Plant, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = ?1"))?;
    stmt.query_row(params![plant_id.to_string()], row_to_plant)
        .optional()?
        .ok_or(DatabaseError::PlantNotFound(plant_id))
}

fn fetch_archetype(conn: &Connection, archetype_id: i64) -> Result<Archetype, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, default_interval_days FROM archetypes WHERE id = ?1")?;
    stmt.query_row(params![archetype_id], |row| {
        Ok(Archetype {
            id: row.get(0)?,
            name: row.get(1)?,
            default_interval_days: row.get(2)?,
        })
    })
    .optional()?
    .ok_or(DatabaseError::ArchetypeNotFound(archetype_id))
}

/// Full event history for one plant, in replay order `(at, id)`.
fn fetch_history(conn: &Connection, plant_id: Uuid) -> Result<Vec<Event>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE plant_id = ?1 ORDER BY at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![plant_id.to_string()], row_to_event)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Persist engine output onto the plant row. The only write path for
/// the three derived columns.
fn write_derived(
    conn: &Connection,
    plant_id: Uuid,
    derived: &DerivedState,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE plants SET current_interval = ?2, last_watered_at = ?3, next_check_at = ?4
         WHERE id = ?1",
        params![
            plant_id.to_string(),
            derived.current_interval,
            derived.last_watered_at.map(|dt| dt.to_rfc3339()),
            derived.next_check_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// A room together with its plants, ordered for the triage view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOverview {
    pub room: Room,
    pub plants: Vec<Plant>,
}

/// SQLite database for the plant tracker.
pub struct Database {
    conn: Connection,
    locks: PlantLocks,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/verdant/verdant.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("verdant.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            locks: PlantLocks::new(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            locks: PlantLocks::new(),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(indoc! {"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS archetypes (
                id                    INTEGER PRIMARY KEY,
                name                  TEXT NOT NULL UNIQUE,
                default_interval_days REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS plants (
                id               TEXT PRIMARY KEY,
                name             TEXT NOT NULL,
                room_id          TEXT NOT NULL REFERENCES rooms(id),
                archetype_id     INTEGER NOT NULL REFERENCES archetypes(id),
                water_amount_ml  REAL,
                created_at       TEXT NOT NULL,
                current_interval REAL NOT NULL,
                last_watered_at  TEXT,
                next_check_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id          TEXT NOT NULL REFERENCES plants(id) ON DELETE CASCADE,
                kind              TEXT NOT NULL,
                at                TEXT NOT NULL,
                is_anomaly        INTEGER NOT NULL DEFAULT 0,
                soil_condition    TEXT,
                snooze_extra_days INTEGER,
                note              TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_events_plant_at ON events(plant_id, at, id);
            CREATE INDEX IF NOT EXISTS idx_plants_next_check ON plants(next_check_at);
            CREATE INDEX IF NOT EXISTS idx_plants_room ON plants(room_id);
        "})?;

        for (id, name, interval) in SEED_ARCHETYPES {
            self.conn.execute(
                "INSERT OR IGNORE INTO archetypes (id, name, default_interval_days)
                 VALUES (?1, ?2, ?3)",
                params![id, name, interval],
            )?;
        }
        Ok(())
    }

    // === Archetypes ===

    pub fn list_archetypes(&self) -> Result<Vec<Archetype>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, default_interval_days FROM archetypes ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Archetype {
                id: row.get(0)?,
                name: row.get(1)?,
                default_interval_days: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_archetype(&self, archetype_id: i64) -> Result<Archetype, DatabaseError> {
        fetch_archetype(&self.conn, archetype_id)
    }

    // === Rooms ===

    /// Create a regular room, appended to the current sort order.
    pub fn create_room(&self, name: &str) -> Result<Room, DatabaseError> {
        let sort_order: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM rooms WHERE name != ?1",
            params![GRAVEYARD_ROOM],
            |row| row.get(0),
        )?;
        let room = Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sort_order,
        };
        self.conn.execute(
            "INSERT INTO rooms (id, name, sort_order) VALUES (?1, ?2, ?3)",
            params![room.id.to_string(), room.name, room.sort_order],
        )?;
        Ok(room)
    }

    pub fn get_room(&self, room_id: Uuid) -> Result<Room, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order FROM rooms WHERE id = ?1")?;
        stmt.query_row(params![room_id.to_string()], row_to_room)
            .optional()?
            .ok_or(DatabaseError::RoomNotFound(room_id))
    }

    pub fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order FROM rooms ORDER BY sort_order, name")?;
        let rows = stmt.query_map([], row_to_room)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Find the Graveyard room, creating it on first use.
    pub fn graveyard(&self) -> Result<Room, DatabaseError> {
        self.room_by_name_or_create(GRAVEYARD_ROOM, 999)
    }

    /// Find the Default room, creating it on first use.
    pub fn default_room(&self) -> Result<Room, DatabaseError> {
        self.room_by_name_or_create(DEFAULT_ROOM, 0)
    }

    fn room_by_name_or_create(&self, name: &str, sort_order: i64) -> Result<Room, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order FROM rooms WHERE name = ?1")?;
        if let Some(room) = stmt.query_row(params![name], row_to_room).optional()? {
            return Ok(room);
        }
        let room = Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sort_order,
        };
        self.conn.execute(
            "INSERT INTO rooms (id, name, sort_order) VALUES (?1, ?2, ?3)",
            params![room.id.to_string(), room.name, room.sort_order],
        )?;
        Ok(room)
    }

    pub fn rename_room(&self, room_id: Uuid, name: &str) -> Result<Room, DatabaseError> {
        let room = self.get_room(room_id)?;
        if room.is_graveyard() {
            return Err(DatabaseError::GraveyardProtected);
        }
        self.conn.execute(
            "UPDATE rooms SET name = ?2 WHERE id = ?1",
            params![room_id.to_string(), name],
        )?;
        self.get_room(room_id)
    }

    pub fn set_room_order(&self, room_id: Uuid, sort_order: i64) -> Result<Room, DatabaseError> {
        self.get_room(room_id)?;
        self.conn.execute(
            "UPDATE rooms SET sort_order = ?2 WHERE id = ?1",
            params![room_id.to_string(), sort_order],
        )?;
        self.get_room(room_id)
    }

    /// Delete a room. Its plants, if any, move to the Default room.
    /// The Graveyard cannot be deleted.
    pub fn delete_room(&self, room_id: Uuid) -> Result<(), DatabaseError> {
        let room = self.get_room(room_id)?;
        if room.is_graveyard() {
            return Err(DatabaseError::GraveyardProtected);
        }

        let tx = self.conn.unchecked_transaction()?;
        let occupied: i64 = tx.query_row(
            "SELECT COUNT(*) FROM plants WHERE room_id = ?1",
            params![room_id.to_string()],
            |row| row.get(0),
        )?;
        if occupied > 0 {
            let fallback = self.default_room()?;
            tx.execute(
                "UPDATE plants SET room_id = ?2 WHERE room_id = ?1",
                params![room_id.to_string(), fallback.id.to_string()],
            )?;
        }
        tx.execute("DELETE FROM rooms WHERE id = ?1", params![room_id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    // === Plants ===

    /// Create a plant with derived fields initialized from its
    /// archetype: interval at the seed value, due for its first check
    /// immediately, never watered.
    pub fn create_plant(
        &self,
        name: &str,
        room_id: Uuid,
        archetype_id: i64,
        water_amount_ml: Option<f64>,
    ) -> Result<Plant, DatabaseError> {
        self.get_room(room_id)?;
        let archetype = self.get_archetype(archetype_id)?;
        let now = Utc::now();
        let plant = Plant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            room_id,
            archetype_id,
            water_amount_ml,
            created_at: now,
            current_interval: archetype.default_interval_days,
            last_watered_at: None,
            next_check_at: now,
        };
        self.conn.execute(
            &format!("INSERT INTO plants ({PLANT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                plant.id.to_string(),
                plant.name,
                plant.room_id.to_string(),
                plant.archetype_id,
                plant.water_amount_ml,
                plant.created_at.to_rfc3339(),
                plant.current_interval,
                Option::<String>::None,
                plant.next_check_at.to_rfc3339(),
            ],
        )?;
        Ok(plant)
    }

    pub fn get_plant(&self, plant_id: Uuid) -> Result<Plant, DatabaseError> {
        fetch_plant(&self.conn, plant_id)
    }

    /// Look a plant up by id, falling back to an exact name match.
    pub fn find_plant(&self, query: &str) -> Result<Plant, DatabaseError> {
        if let Ok(id) = Uuid::parse_str(query) {
            return self.get_plant(id);
        }
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PLANT_COLUMNS} FROM plants WHERE name = ?1"))?;
        let matches = stmt
            .query_map(params![query], row_to_plant)?
            .collect::<Result<Vec<_>, _>>()?;
        match matches.len() {
            0 => Err(DatabaseError::NoPlantNamed(query.to_string())),
            1 => Ok(matches.into_iter().next().expect("len checked")),
            _ => Err(DatabaseError::AmbiguousName(query.to_string())),
        }
    }

    /// Plants in one room, most urgent first.
    pub fn list_plants(&self, room_id: Uuid) -> Result<Vec<Plant>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE room_id = ?1 ORDER BY next_check_at, name"
        ))?;
        let rows = stmt.query_map(params![room_id.to_string()], row_to_plant)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Triage view: every room except the Graveyard, rooms in sort
    /// order, plants most urgent first.
    pub fn dashboard(&self) -> Result<Vec<RoomOverview>, DatabaseError> {
        let rooms = self.list_rooms()?;
        let mut overview = Vec::new();
        for room in rooms {
            if room.is_graveyard() {
                continue;
            }
            let plants = self.list_plants(room.id)?;
            overview.push(RoomOverview { room, plants });
        }
        Ok(overview)
    }

    /// Plants resting in the Graveyard.
    pub fn graveyard_plants(&self) -> Result<Vec<Plant>, DatabaseError> {
        let graveyard = self.graveyard()?;
        self.list_plants(graveyard.id)
    }

    pub fn rename_plant(&self, plant_id: Uuid, name: &str) -> Result<Plant, DatabaseError> {
        self.get_plant(plant_id)?;
        self.conn.execute(
            "UPDATE plants SET name = ?2 WHERE id = ?1",
            params![plant_id.to_string(), name],
        )?;
        self.get_plant(plant_id)
    }

    pub fn move_plant(&self, plant_id: Uuid, room_id: Uuid) -> Result<Plant, DatabaseError> {
        self.get_plant(plant_id)?;
        self.get_room(room_id)?;
        self.conn.execute(
            "UPDATE plants SET room_id = ?2 WHERE id = ?1",
            params![plant_id.to_string(), room_id.to_string()],
        )?;
        self.get_plant(plant_id)
    }

    pub fn set_water_amount(
        &self,
        plant_id: Uuid,
        water_amount_ml: Option<f64>,
    ) -> Result<Plant, DatabaseError> {
        self.get_plant(plant_id)?;
        self.conn.execute(
            "UPDATE plants SET water_amount_ml = ?2 WHERE id = ?1",
            params![plant_id.to_string(), water_amount_ml],
        )?;
        self.get_plant(plant_id)
    }

    /// Soft delete: move the plant to the Graveyard, history intact.
    pub fn bury_plant(&self, plant_id: Uuid) -> Result<Plant, DatabaseError> {
        let graveyard = self.graveyard()?;
        self.move_plant(plant_id, graveyard.id)
    }

    /// Bring a buried plant back into a regular room.
    pub fn restore_plant(&self, plant_id: Uuid, room_id: Uuid) -> Result<Plant, DatabaseError> {
        let plant = self.get_plant(plant_id)?;
        let graveyard = self.graveyard()?;
        if plant.room_id != graveyard.id {
            return Err(DatabaseError::NotInGraveyard);
        }
        let target = self.get_room(room_id)?;
        if target.is_graveyard() {
            return Err(DatabaseError::RestoreIntoGraveyard);
        }
        self.move_plant(plant_id, room_id)
    }

    /// Manual interval edit: re-anchors the next check without a full
    /// replay, per the engine's direct-write rule.
    pub fn set_interval(&self, plant_id: Uuid, new_interval: f64) -> Result<Plant, DatabaseError> {
        self.locks.with(plant_id, || {
            let plant = fetch_plant(&self.conn, plant_id)?;
            let derived =
                engine::manual_interval(plant.created_at, plant.last_watered_at, new_interval)?;
            write_derived(&self.conn, plant_id, &derived)?;
            fetch_plant(&self.conn, plant_id)
        })
    }

    // === Events ===

    /// Full event history for a plant, in replay order.
    pub fn history(&self, plant_id: Uuid) -> Result<Vec<Event>, DatabaseError> {
        self.get_plant(plant_id)?;
        fetch_history(&self.conn, plant_id)
    }

    pub fn get_event(&self, event_id: i64) -> Result<Event, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"))?;
        stmt.query_row(params![event_id], row_to_event)
            .optional()?
            .ok_or(DatabaseError::EventNotFound(event_id))
    }

    /// Append an event and replay the plant's whole history.
    ///
    /// Insert, replay, and derived-field write share one transaction
    /// under the plant's lock, so a failed replay leaves both the log
    /// and the derived state untouched.
    pub fn log_event(
        &self,
        plant_id: Uuid,
        spec: NewEvent,
        settings: &EngineSettings,
    ) -> Result<Plant, DatabaseError> {
        self.locks.with(plant_id, || {
            let tx = self.conn.unchecked_transaction()?;
            let plant = fetch_plant(&tx, plant_id)?;
            let at = spec.at.unwrap_or_else(Utc::now);
            tx.execute(
                &format!(
                    "INSERT INTO events ({EVENT_COLUMNS})
                     VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    plant_id.to_string(),
                    format_event_kind(spec.kind),
                    at.to_rfc3339(),
                    spec.is_anomaly,
                    format_soil_condition(spec.soil_condition),
                    spec.snooze_extra_days,
                    spec.note,
                ],
            )?;
            let derived = Self::replay(&tx, &plant, settings)?;
            write_derived(&tx, plant_id, &derived)?;
            tx.commit()?;
            fetch_plant(&self.conn, plant_id)
        })
    }

    /// Delete an event and replay the plant's shortened history.
    pub fn delete_event(
        &self,
        event_id: i64,
        settings: &EngineSettings,
    ) -> Result<Plant, DatabaseError> {
        let event = self.get_event(event_id)?;
        self.locks.with(event.plant_id, || {
            let tx = self.conn.unchecked_transaction()?;
            let plant = fetch_plant(&tx, event.plant_id)?;
            tx.execute("DELETE FROM events WHERE id = ?1", params![event_id])?;
            let derived = Self::replay(&tx, &plant, settings)?;
            write_derived(&tx, event.plant_id, &derived)?;
            tx.commit()?;
            fetch_plant(&self.conn, event.plant_id)
        })
    }

    /// Recompute one plant without touching its log. Used after a
    /// settings change.
    pub fn recompute_plant(
        &self,
        plant_id: Uuid,
        settings: &EngineSettings,
    ) -> Result<Plant, DatabaseError> {
        self.locks.with(plant_id, || {
            let tx = self.conn.unchecked_transaction()?;
            let plant = fetch_plant(&tx, plant_id)?;
            let derived = Self::replay(&tx, &plant, settings)?;
            write_derived(&tx, plant_id, &derived)?;
            tx.commit()?;
            fetch_plant(&self.conn, plant_id)
        })
    }

    /// Recompute every plant. Settings changes affect all schedules.
    pub fn recompute_all(&self, settings: &EngineSettings) -> Result<usize, DatabaseError> {
        let ids = {
            let mut stmt = self.conn.prepare("SELECT id FROM plants")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let mut count = 0;
        for id_str in ids {
            let plant_id =
                parse_uuid(&id_str).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            self.recompute_plant(plant_id, settings)?;
            count += 1;
        }
        Ok(count)
    }

    fn replay(
        conn: &Connection,
        plant: &Plant,
        settings: &EngineSettings,
    ) -> Result<DerivedState, DatabaseError> {
        let archetype = fetch_archetype(conn, plant.archetype_id)?;
        let events = fetch_history(conn, plant.id)?;
        let derived = engine::recompute(
            plant.created_at,
            archetype.default_interval_days,
            &events,
            settings,
        )?;
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn setup() -> (Database, Room, Plant) {
        let db = Database::open_memory().unwrap();
        let room = db.create_room("Living Room").unwrap();
        // Aroid: 7-day default interval.
        let plant = db.create_plant("Monstera", room.id, 3, Some(250.0)).unwrap();
        (db, room, plant)
    }

    #[test]
    fn archetypes_are_seeded_once() {
        let db = Database::open_memory().unwrap();
        let archetypes = db.list_archetypes().unwrap();
        assert_eq!(archetypes.len(), 5);
        assert_eq!(archetypes[0].name, "Fern");
        assert_eq!(archetypes[3].default_interval_days, 30.0);
        // Re-running migration must not duplicate rows.
        db.migrate().unwrap();
        assert_eq!(db.list_archetypes().unwrap().len(), 5);
    }

    #[test]
    fn new_plant_starts_at_archetype_default_and_is_due() {
        let (_db, _room, plant) = setup();
        assert_eq!(plant.current_interval, 7.0);
        assert_eq!(plant.last_watered_at, None);
        assert_eq!(plant.next_check_at, plant.created_at);
    }

    #[test]
    fn create_plant_rejects_unknown_archetype() {
        let db = Database::open_memory().unwrap();
        let room = db.create_room("Office").unwrap();
        assert!(matches!(
            db.create_plant("Ghost", room.id, 42, None),
            Err(DatabaseError::ArchetypeNotFound(42))
        ));
    }

    #[test]
    fn logging_water_persists_engine_output() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();

        let updated = db
            .log_event(plant.id, NewEvent::water().at(t(1)), &settings)
            .unwrap();
        assert_eq!(updated.current_interval, 7.0);
        assert_eq!(updated.last_watered_at, Some(t(1)));
        assert_eq!(updated.next_check_at, t(1) + Duration::days(7));

        let updated = db
            .log_event(plant.id, NewEvent::water().at(t(15)), &settings)
            .unwrap();
        // 0.35 * 14 + 0.65 * 7 = 9.45
        assert!((updated.current_interval - 9.45).abs() < 1e-9);
    }

    #[test]
    fn deleting_an_event_replays_the_shorter_history() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();

        let after_one = db
            .log_event(plant.id, NewEvent::water().at(t(1)), &settings)
            .unwrap();
        db.log_event(plant.id, NewEvent::water().at(t(15)), &settings)
            .unwrap();

        let history = db.history(plant.id).unwrap();
        assert_eq!(history.len(), 2);
        let last = history.last().unwrap();

        let reverted = db.delete_event(last.id, &settings).unwrap();
        assert_eq!(reverted.current_interval, after_one.current_interval);
        assert_eq!(reverted.last_watered_at, after_one.last_watered_at);
        assert_eq!(reverted.next_check_at, after_one.next_check_at);
        assert_eq!(db.history(plant.id).unwrap().len(), 1);
    }

    #[test]
    fn failed_replay_leaves_log_and_derived_state_untouched() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        let watered = db
            .log_event(plant.id, NewEvent::water().at(t(1)), &settings)
            .unwrap();

        let bad = EngineSettings {
            ema_alpha: 2.0,
            ..Default::default()
        };
        let err = db
            .log_event(plant.id, NewEvent::water().at(t(5)), &bad)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::RecomputeRejected(_)));

        // The rejected insert rolled back with the replay.
        assert_eq!(db.history(plant.id).unwrap().len(), 1);
        assert_eq!(db.get_plant(plant.id).unwrap(), watered);
    }

    #[test]
    fn history_orders_equal_timestamps_by_insertion() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        db.log_event(plant.id, NewEvent::snooze().at(t(2)).extra_days(3), &settings)
            .unwrap();
        db.log_event(plant.id, NewEvent::water().at(t(2)), &settings)
            .unwrap();

        let history = db.history(plant.id).unwrap();
        assert_eq!(history[0].kind, EventKind::Snooze);
        assert_eq!(history[1].kind, EventKind::Water);
        assert!(history[0].id < history[1].id);
    }

    #[test]
    fn backdated_event_replays_in_timestamp_order() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        db.log_event(plant.id, NewEvent::water().at(t(15)), &settings)
            .unwrap();
        // Backfill an earlier watering; replay must see it first.
        let updated = db
            .log_event(plant.id, NewEvent::water().at(t(1)), &settings)
            .unwrap();
        assert!((updated.current_interval - 9.45).abs() < 1e-9);
        assert_eq!(updated.last_watered_at, Some(t(15)));
    }

    #[test]
    fn repot_resets_to_archetype_default() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        db.log_event(plant.id, NewEvent::water().at(t(1)), &settings)
            .unwrap();
        db.log_event(plant.id, NewEvent::water().at(t(15)), &settings)
            .unwrap();
        let updated = db
            .log_event(plant.id, NewEvent::repot().at(t(16)), &settings)
            .unwrap();
        assert_eq!(updated.current_interval, 7.0);
        assert_eq!(updated.next_check_at, t(16));
    }

    #[test]
    fn set_interval_reanchors_next_check() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        db.log_event(plant.id, NewEvent::water().at(t(10)), &settings)
            .unwrap();

        let updated = db.set_interval(plant.id, 12.0).unwrap();
        assert_eq!(updated.current_interval, 12.0);
        assert_eq!(updated.next_check_at, t(10) + Duration::days(12));

        assert!(matches!(
            db.set_interval(plant.id, 0.0),
            Err(DatabaseError::RecomputeRejected(_))
        ));
    }

    #[test]
    fn set_interval_without_watering_anchors_on_creation() {
        let (db, _room, plant) = setup();
        let updated = db.set_interval(plant.id, 3.0).unwrap();
        assert_eq!(updated.next_check_at, plant.created_at + Duration::days(3));
    }

    #[test]
    fn recompute_all_applies_new_settings() {
        let (db, room, plant) = setup();
        let settings = EngineSettings::default();
        let other = db.create_plant("Fern", room.id, 1, None).unwrap();
        for id in [plant.id, other.id] {
            db.log_event(id, NewEvent::water().at(t(1)), &settings).unwrap();
            db.log_event(id, NewEvent::water().at(t(15)), &settings).unwrap();
        }

        let sharper = EngineSettings {
            ema_alpha: 0.9,
            ..Default::default()
        };
        assert_eq!(db.recompute_all(&sharper).unwrap(), 2);
        let updated = db.get_plant(plant.id).unwrap();
        // 0.9 * 14 + 0.1 * 7 = 13.3
        assert!((updated.current_interval - 13.3).abs() < 1e-9);
    }

    #[test]
    fn find_plant_by_name_and_id() {
        let (db, room, plant) = setup();
        assert_eq!(db.find_plant("Monstera").unwrap().id, plant.id);
        assert_eq!(db.find_plant(&plant.id.to_string()).unwrap().id, plant.id);
        assert!(matches!(
            db.find_plant("Ficus"),
            Err(DatabaseError::NoPlantNamed(_))
        ));

        db.create_plant("Monstera", room.id, 3, None).unwrap();
        assert!(matches!(
            db.find_plant("Monstera"),
            Err(DatabaseError::AmbiguousName(_))
        ));
    }

    #[test]
    fn bury_and_restore_round_trip() {
        let (db, room, plant) = setup();
        let buried = db.bury_plant(plant.id).unwrap();
        let graveyard = db.graveyard().unwrap();
        assert_eq!(buried.room_id, graveyard.id);
        assert_eq!(db.graveyard_plants().unwrap().len(), 1);

        // Restoring into the graveyard itself is invalid.
        assert!(matches!(
            db.restore_plant(plant.id, graveyard.id),
            Err(DatabaseError::RestoreIntoGraveyard)
        ));

        let restored = db.restore_plant(plant.id, room.id).unwrap();
        assert_eq!(restored.room_id, room.id);

        // A plant outside the graveyard cannot be restored.
        assert!(matches!(
            db.restore_plant(plant.id, room.id),
            Err(DatabaseError::NotInGraveyard)
        ));
    }

    #[test]
    fn dashboard_excludes_graveyard_and_sorts_by_urgency() {
        let (db, room, plant) = setup();
        let settings = EngineSettings::default();
        let urgent = db.create_plant("Calathea", room.id, 5, None).unwrap();
        db.log_event(plant.id, NewEvent::water().at(t(20)), &settings)
            .unwrap();
        db.bury_plant(urgent.id).unwrap();
        db.graveyard().unwrap();

        let overview = db.dashboard().unwrap();
        assert!(overview.iter().all(|o| !o.room.is_graveyard()));
        let living: &RoomOverview = overview
            .iter()
            .find(|o| o.room.id == room.id)
            .expect("room present");
        assert_eq!(living.plants.len(), 1);
        assert_eq!(living.plants[0].id, plant.id);
    }

    #[test]
    fn deleting_a_room_moves_plants_to_default() {
        let (db, room, plant) = setup();
        db.delete_room(room.id).unwrap();
        let moved = db.get_plant(plant.id).unwrap();
        assert_eq!(moved.room_id, db.default_room().unwrap().id);
        assert!(matches!(
            db.get_room(room.id),
            Err(DatabaseError::RoomNotFound(_))
        ));
    }

    #[test]
    fn graveyard_room_is_protected() {
        let db = Database::open_memory().unwrap();
        let graveyard = db.graveyard().unwrap();
        assert!(matches!(
            db.delete_room(graveyard.id),
            Err(DatabaseError::GraveyardProtected)
        ));
        assert!(matches!(
            db.rename_room(graveyard.id, "Compost"),
            Err(DatabaseError::GraveyardProtected)
        ));
    }

    #[test]
    fn room_rename_and_reorder() {
        let db = Database::open_memory().unwrap();
        let room = db.create_room("Bedroom").unwrap();
        let renamed = db.rename_room(room.id, "Sunroom").unwrap();
        assert_eq!(renamed.name, "Sunroom");
        let reordered = db.set_room_order(room.id, 5).unwrap();
        assert_eq!(reordered.sort_order, 5);
    }

    #[test]
    fn event_note_and_flags_round_trip() {
        let (db, _room, plant) = setup();
        let settings = EngineSettings::default();
        db.log_event(
            plant.id,
            NewEvent::water()
                .at(t(3))
                .anomaly(true)
                .soil(SoilCondition::Dry)
                .note("holiday backfill"),
            &settings,
        )
        .unwrap();
        let history = db.history(plant.id).unwrap();
        let event = &history[0];
        assert!(event.is_anomaly);
        assert_eq!(event.soil_condition, Some(SoilCondition::Dry));
        assert_eq!(event.note.as_deref(), Some("holiday backfill"));
    }
}
