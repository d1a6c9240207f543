//! # Verdant Core Library
//!
//! Core business logic for Verdant, a household plant-watering tracker.
//! Users log watering, snooze, and repot events per plant; the library
//! folds each plant's history into a smoothed watering-interval estimate
//! and the date it should next be checked.
//!
//! ## Architecture
//!
//! - **Recalculation Engine**: a pure fold over the ordered event log;
//!   the sole writer of a plant's derived schedule fields
//! - **Storage**: SQLite-backed rooms, plants, archetypes, and the
//!   append-only event log, with TOML-based configuration
//! - **Locks**: per-plant critical sections around every
//!   read-compute-write sequence
//!
//! ## Key Components
//!
//! - [`recompute`]: event-history replay producing [`DerivedState`]
//! - [`Database`]: persistence and recompute triggers
//! - [`Config`]: engine settings persistence
//! - [`EngineSettings`]: smoothing parameters with documented defaults

pub mod engine;
pub mod error;
pub mod locks;
pub mod model;
pub mod settings;
pub mod storage;

pub use engine::{manual_interval, recompute, recompute_at, DerivedState};
pub use error::{ConfigError, CoreError, DatabaseError, EngineError};
pub use locks::PlantLocks;
pub use model::{Archetype, Event, EventKind, NewEvent, Plant, Room, SoilCondition};
pub use settings::{EngineSettings, SettingsOverrides};
pub use storage::database::RoomOverview;
pub use storage::{Config, Database};
