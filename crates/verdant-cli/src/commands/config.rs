use clap::Subcommand;
use verdant_core::{Config, Database};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration
    Show,
    /// Get a single value (ema_alpha, snooze_factor)
    Get { key: String },
    /// Set a value and replay every plant's schedule with it
    Set { key: String, value: String },
    /// Reset the configuration to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let cfg = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        ConfigAction::Get { key } => {
            let cfg = Config::load()?;
            match cfg.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut cfg = Config::load()?;
            cfg.set(&key, &value)?;
            // Settings are an engine input: derived schedules change
            // with them, so replay everything.
            let db = Database::open()?;
            let replayed = db.recompute_all(&cfg.engine_settings())?;
            println!(
                "{}",
                serde_json::json!({ "config": cfg, "replayed_plants": replayed })
            );
        }
        ConfigAction::Reset => {
            let cfg = Config::default();
            cfg.save()?;
            let db = Database::open()?;
            db.recompute_all(&cfg.engine_settings())?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
