use anyhow::Context;
use inkpost_db::{MigrationDirection, MigrationReport, MigrationTarget};

use crate::app::App;

pub async fn run(migration: &str) -> anyhow::Result<()> {
    let app = App::bootstrap()?;
    let target = MigrationTarget::from_arg(Some(migration))?;
    let runner = app.runner().await?;

    let report = match runner.run(&target).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_retryable() {
                tracing::warn!("committed steps are kept; re-run migrate once the cause is fixed to resume");
            }
            return Err(e).with_context(|| format!("failed to migrate to {}", target));
        }
    };
    print_report(&report);

    let version = runner
        .current_version()
        .await
        .context("failed to get database version")?;
    runner.database().close().await;

    println!("✅ migrate success {}", inkpost_core::version());
    println!(
        "DatabaseVersion: {}",
        version.as_ref().map_or("none", |id| id.as_str())
    );
    Ok(())
}

fn print_report(report: &MigrationReport) {
    if report.schema_initialized {
        println!("🧱 Schema initialized; all registered migrations marked applied");
    } else if report.is_noop() {
        println!("Nothing to migrate");
    }

    let (label, ids) = match report.direction {
        MigrationDirection::Up => ("Applied", &report.applied),
        MigrationDirection::Down => ("Rolled back", &report.rolled_back),
    };
    for id in ids {
        println!("  {} {}", label, id);
    }

    if report.step_count() > 0 {
        println!(
            "{} migration(s) in {}ms",
            report.step_count(),
            report.execution_time_ms
        );
    }
}
