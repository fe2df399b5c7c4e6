use anyhow::{bail, Context as _};
use chrono::{DateTime, Utc};
use inkpost_db::MigrationId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tera::Context;

use crate::app::App;
use crate::generators::TemplateEngine;

static MIGRATION_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^m(20[0-9]{6}_[0-9]{6})\.rs$").expect("migration file pattern compiles"));

/// A freshly generated migration source file
#[derive(Debug)]
pub struct Scaffold {
    pub id: MigrationId,
    pub module: String,
    pub struct_name: String,
    pub path: PathBuf,
}

pub fn run(dir: Option<PathBuf>, description: Option<&str>) -> anyhow::Result<()> {
    let app = App::bootstrap()?;
    let dir = dir.unwrap_or_else(|| app.config.migrations_path());

    let scaffold = scaffold_migration(&dir, description, Utc::now())?;

    tracing::info!(
        "migration file {} generated, implement the migration logic and then run `migrate` to apply",
        scaffold.path.display()
    );
    println!("📄 Created migration: {}", scaffold.path.display());
    println!("\nRegister it in {}:", dir.join("mod.rs").display());
    println!("    mod {};", scaffold.module);
    println!(
        "    Arc::new({}::{}),   // in all()",
        scaffold.module, scaffold.struct_name
    );
    Ok(())
}

/// Render a new migration into `dir` with an ID that sorts after every existing one
pub fn scaffold_migration(
    dir: &Path,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> anyhow::Result<Scaffold> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create migrations directory {}", dir.display()))?;

    let latest = latest_migration_in(dir)?;
    let id = MigrationId::generate_after(now, latest.as_ref()).context("cannot generate a new migration ID")?;
    let module = format!("m{}", id);
    let struct_name = format!("M{}", id.as_str().replace('_', ""));
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Migration {}", id));

    let mut context = Context::new();
    context.insert("id", id.as_str());
    context.insert("struct_name", &struct_name);
    context.insert("description", &description.replace('\n', " "));
    context.insert("description_literal", &format!("{:?}", description));

    let source = TemplateEngine::new()?.render_with_context("migration", &context)?;
    let path = dir.join(format!("{}.rs", module));
    write_new_file(&path, &source)?;

    Ok(Scaffold {
        id,
        module,
        struct_name,
        path,
    })
}

/// Greatest ID among `m<ID>.rs` files in `dir`
pub fn latest_migration_in(dir: &Path) -> anyhow::Result<Option<MigrationId>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<MigrationId> = None;
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read migrations directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.context("failed to read directory entry")?;
        let file_name = entry.file_name();
        let Some(captures) = file_name.to_str().and_then(|name| MIGRATION_FILE.captures(name)) else {
            continue;
        };
        let Ok(id) = MigrationId::parse(&captures[1]) else {
            tracing::warn!("ignoring migration file with invalid ID: {:?}", file_name);
            continue;
        };
        if latest.as_ref().map_or(true, |current| id > *current) {
            latest = Some(id);
        }
    }

    Ok(latest)
}

/// Write `contents` to `path`, refusing to replace an existing file
fn write_new_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("{} already exists, refusing to overwrite it", path.display())
        }
        Err(e) => return Err(e).with_context(|| format!("failed to create {}", path.display())),
    };

    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}
