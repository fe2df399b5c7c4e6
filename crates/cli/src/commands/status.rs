use inkpost_core::AppConfigTrait;
use inkpost_db::StatusReport;

use crate::app::App;

pub async fn run(json: bool) -> anyhow::Result<()> {
    let app = App::bootstrap()?;
    let runner = app.runner().await?;
    let report = runner.status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let sources = app.config.config_sources();
    println!("Database: {} [{}]", runner.database().endpoint(), runner.database().backend());
    if let Some(source) = sources.get("database_url") {
        println!("  url from {}", source);
    }
    if let Some(source) = sources.get("migrations_table") {
        println!("  ledger table {} from {}", runner.options().table, source);
    }
    if runner.options().validate_unknown_migrations {
        println!("  strict: unknown ledger entries abort migrate");
    }
    println!();
    print_table(&report);
    Ok(())
}

fn print_table(report: &StatusReport) {
    println!("Migration Status:");
    println!("================");

    if report.migrations.is_empty() {
        println!("No migrations registered");
    }
    for migration in &report.migrations {
        match &migration.applied_at {
            Some(applied_at) => println!("  ✅ {}  {}  (applied {})", migration.id, migration.description, applied_at),
            None => println!("  ⏳ {}  {}", migration.id, migration.description),
        }
    }

    for id in &report.unknown {
        println!("  ❓ {}  (not registered in this build)", id);
    }

    println!(
        "\nDatabaseVersion: {}",
        report.current_version.as_ref().map_or("none", |id| id.as_str())
    );
}
