use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "verdant", version, about = "Verdant plant-watering tracker")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plant management
    Plant {
        #[command(subcommand)]
        action: commands::plant::PlantAction,
    },
    /// Room management
    Room {
        #[command(subcommand)]
        action: commands::room::RoomAction,
    },
    /// Event logging (water, snooze, repot)
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Plant archetypes
    Archetype {
        #[command(subcommand)]
        action: commands::archetype::ArchetypeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Triage view: what needs checking, most urgent first
    Dashboard,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plant { action } => commands::plant::run(action),
        Commands::Room { action } => commands::room::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Archetype { action } => commands::archetype::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Dashboard => commands::dashboard::run(),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
