mod app;
mod commands;
mod generators;
mod migrations;

use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(about = "inkpost blog service tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply (or roll back) migrations to the database tables
    Migrate {
        /// Migration to migrate to, blank means latest version
        #[arg(long, default_value = "")]
        migration: String,
    },

    /// Generate an empty migration file
    MakeMigration {
        /// Directory to write the migration into (defaults to MIGRATIONS_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Short summary of the schema change
        #[arg(long)]
        description: Option<String>,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { migration } => {
            migrate::run(&migration).await?;
        }
        Commands::MakeMigration { dir, description } => {
            make_migration::run(dir, description.as_deref())?;
        }
        Commands::Status { json } => {
            status::run(json).await?;
        }
        Commands::Version => {
            version::run();
        }
    }

    Ok(())
}
