use clap::Subcommand;
use uuid::Uuid;
use verdant_core::Database;

#[derive(Subcommand)]
pub enum PlantAction {
    /// Add a plant to a room
    Add {
        name: String,
        /// Room id
        #[arg(long)]
        room: Uuid,
        /// Archetype id (see `verdant archetype list`)
        #[arg(long)]
        archetype: i64,
        /// Water amount per watering, in milliliters
        #[arg(long)]
        water_amount: Option<f64>,
    },
    /// List plants, most urgent first
    List {
        /// Restrict to one room
        #[arg(long)]
        room: Option<Uuid>,
        /// List buried plants instead
        #[arg(long)]
        graveyard: bool,
    },
    /// Show one plant with its event history
    Show {
        /// Plant name or id
        plant: String,
    },
    /// Rename a plant
    Rename {
        plant: String,
        name: String,
    },
    /// Move a plant to another room
    Move {
        plant: String,
        #[arg(long)]
        room: Uuid,
    },
    /// Override the learned watering interval (days)
    SetInterval {
        plant: String,
        days: f64,
    },
    /// Set or clear the water amount in milliliters
    SetWaterAmount {
        plant: String,
        ml: Option<f64>,
    },
    /// Move a plant to the Graveyard
    Rm {
        plant: String,
    },
    /// Restore a plant from the Graveyard into a room
    Restore {
        plant: String,
        #[arg(long)]
        room: Uuid,
    },
}

pub fn run(action: PlantAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        PlantAction::Add {
            name,
            room,
            archetype,
            water_amount,
        } => {
            let plant = db.create_plant(&name, room, archetype, water_amount)?;
            println!("{}", serde_json::to_string_pretty(&plant)?);
        }
        PlantAction::List { room, graveyard } => {
            if graveyard {
                let plants = db.graveyard_plants()?;
                println!("{}", serde_json::to_string_pretty(&plants)?);
            } else if let Some(room_id) = room {
                let plants = db.list_plants(room_id)?;
                println!("{}", serde_json::to_string_pretty(&plants)?);
            } else {
                let plants: Vec<_> = db
                    .dashboard()?
                    .into_iter()
                    .flat_map(|overview| overview.plants)
                    .collect();
                println!("{}", serde_json::to_string_pretty(&plants)?);
            }
        }
        PlantAction::Show { plant } => {
            let plant = db.find_plant(&plant)?;
            let events = db.history(plant.id)?;
            let detail = serde_json::json!({ "plant": plant, "events": events });
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        PlantAction::Rename { plant, name } => {
            let plant = db.find_plant(&plant)?;
            let updated = db.rename_plant(plant.id, &name)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        PlantAction::Move { plant, room } => {
            let plant = db.find_plant(&plant)?;
            let updated = db.move_plant(plant.id, room)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        PlantAction::SetInterval { plant, days } => {
            let plant = db.find_plant(&plant)?;
            let updated = db.set_interval(plant.id, days)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        PlantAction::SetWaterAmount { plant, ml } => {
            let plant = db.find_plant(&plant)?;
            let updated = db.set_water_amount(plant.id, ml)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        PlantAction::Rm { plant } => {
            let plant = db.find_plant(&plant)?;
            let buried = db.bury_plant(plant.id)?;
            println!("{}", serde_json::to_string_pretty(&buried)?);
        }
        PlantAction::Restore { plant, room } => {
            let plant = db.find_plant(&plant)?;
            let restored = db.restore_plant(plant.id, room)?;
            println!("{}", serde_json::to_string_pretty(&restored)?);
        }
    }
    Ok(())
}
