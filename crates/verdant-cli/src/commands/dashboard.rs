use chrono::Utc;
use verdant_core::Database;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();
    let overview = db.dashboard()?;

    let due: Vec<_> = overview
        .iter()
        .flat_map(|o| o.plants.iter())
        .filter(|p| p.is_due(now))
        .map(|p| p.id)
        .collect();

    let view = serde_json::json!({
        "as_of": now,
        "due_plants": due,
        "rooms": overview,
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
