use clap::Subcommand;
use uuid::Uuid;
use verdant_core::Database;

#[derive(Subcommand)]
pub enum RoomAction {
    /// Add a room
    Add { name: String },
    /// List rooms in display order
    List,
    /// Rename a room
    Rename { room: Uuid, name: String },
    /// Change a room's position in the display order
    Reorder { room: Uuid, position: i64 },
    /// Delete a room; its plants move to the Default room
    Rm { room: Uuid },
}

pub fn run(action: RoomAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        RoomAction::Add { name } => {
            let room = db.create_room(&name)?;
            println!("{}", serde_json::to_string_pretty(&room)?);
        }
        RoomAction::List => {
            let rooms = db.list_rooms()?;
            println!("{}", serde_json::to_string_pretty(&rooms)?);
        }
        RoomAction::Rename { room, name } => {
            let updated = db.rename_room(room, &name)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        RoomAction::Reorder { room, position } => {
            let updated = db.set_room_order(room, position)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        RoomAction::Rm { room } => {
            db.delete_room(room)?;
            println!("{{\"deleted\": \"{room}\"}}");
        }
    }
    Ok(())
}
