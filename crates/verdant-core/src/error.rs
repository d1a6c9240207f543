//! Core error types for verdant-core.
//!
//! This module defines the error hierarchy using thiserror so callers
//! can distinguish engine contract violations from storage failures.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for verdant-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Recalculation engine contract violations
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Contract violations reported by the recalculation engine.
///
/// These are caller errors, never internal failures: the engine itself
/// is a pure function and cannot fail once its inputs are valid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A smoothing parameter is outside the open interval (0, 1)
    #[error("Invalid setting '{field}': {value} must be strictly between 0 and 1")]
    InvalidSetting { field: &'static str, value: f64 },

    /// The caller passed an event history that is not sorted ascending
    /// by (timestamp, insertion id)
    #[error("Event history is out of order at event {event_id}")]
    OutOfOrderEvents { event_id: i64 },

    /// A watering interval must always be a positive number of days
    #[error("Watering interval must be positive, got {0}")]
    NonPositiveInterval(f64),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// No plant with the given id
    #[error("Plant not found: {0}")]
    PlantNotFound(Uuid),

    /// No room with the given id
    #[error("Room not found: {0}")]
    RoomNotFound(Uuid),

    /// No event with the given id
    #[error("Event not found: {0}")]
    EventNotFound(i64),

    /// No archetype with the given id
    #[error("Archetype not found: {0}")]
    ArchetypeNotFound(i64),

    /// No plant matches a name lookup
    #[error("No plant named '{0}'")]
    NoPlantNamed(String),

    /// More than one plant matches a name lookup
    #[error("More than one plant is named '{0}', use its id instead")]
    AmbiguousName(String),

    /// The Graveyard room is managed by the system
    #[error("The Graveyard room cannot be deleted")]
    GraveyardProtected,

    /// Restore was attempted on a plant that is not buried
    #[error("Plant is not in the Graveyard")]
    NotInGraveyard,

    /// Restore must target a regular room
    #[error("Cannot restore a plant into the Graveyard")]
    RestoreIntoGraveyard,

    /// A recompute trigger failed before any state was written
    #[error("Recalculation rejected: {0}")]
    RecomputeRejected(#[from] EngineError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
