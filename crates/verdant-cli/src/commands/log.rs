use chrono::{DateTime, Utc};
use clap::Subcommand;
use verdant_core::{Config, Database, NewEvent, SoilCondition};

#[derive(Subcommand)]
pub enum LogAction {
    /// Log a watering
    Water {
        /// Plant name or id
        plant: String,
        /// Soil was dry: check again 20% sooner
        #[arg(long)]
        dry: bool,
        /// Out-of-rhythm watering: keep the learned interval untouched
        #[arg(long)]
        anomaly: bool,
        /// Note attached to the event
        #[arg(long)]
        note: Option<String>,
        /// Event timestamp (RFC3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Defer the next check without logging a watering
    Snooze {
        plant: String,
        /// Days to defer by; defaults to a fraction of the interval
        #[arg(long)]
        days: Option<i64>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Log a repot: forget the learned rhythm
    Repot {
        plant: String,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Delete an event and replay the remaining history
    Rm {
        event_id: i64,
    },
    /// Show a plant's event history, oldest first
    History {
        plant: String,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = Config::load_or_default().engine_settings();

    match action {
        LogAction::Water {
            plant,
            dry,
            anomaly,
            note,
            at,
        } => {
            let plant = db.find_plant(&plant)?;
            let mut spec = NewEvent::water().anomaly(anomaly);
            if dry {
                spec = spec.soil(SoilCondition::Dry);
            }
            if let Some(note) = note {
                spec = spec.note(note);
            }
            if let Some(at) = at {
                spec = spec.at(at);
            }
            let updated = db.log_event(plant.id, spec, &settings)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        LogAction::Snooze { plant, days, at } => {
            let plant = db.find_plant(&plant)?;
            let mut spec = NewEvent::snooze();
            if let Some(days) = days {
                spec = spec.extra_days(days);
            }
            if let Some(at) = at {
                spec = spec.at(at);
            }
            let updated = db.log_event(plant.id, spec, &settings)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        LogAction::Repot { plant, at } => {
            let plant = db.find_plant(&plant)?;
            let mut spec = NewEvent::repot();
            if let Some(at) = at {
                spec = spec.at(at);
            }
            let updated = db.log_event(plant.id, spec, &settings)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        LogAction::Rm { event_id } => {
            let updated = db.delete_event(event_id, &settings)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        LogAction::History { plant } => {
            let plant = db.find_plant(&plant)?;
            let events = db.history(plant.id)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }
    Ok(())
}
