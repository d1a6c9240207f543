use clap::Subcommand;
use verdant_core::Database;

#[derive(Subcommand)]
pub enum ArchetypeAction {
    /// List the seeded plant archetypes
    List,
}

pub fn run(action: ArchetypeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        ArchetypeAction::List => {
            let archetypes = db.list_archetypes()?;
            println!("{}", serde_json::to_string_pretty(&archetypes)?);
        }
    }
    Ok(())
}
