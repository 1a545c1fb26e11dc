pub mod cli;
pub mod connect;
pub mod db;
pub mod loader;
pub mod settings;
pub mod verify;
pub mod writer;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::cli::Cli;
use crate::loader::TableSnapshot;
use crate::settings::Settings;

/// Destination schema for both tables.
const SCHEMA: &str = "dbo";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_ingest", LevelFilter::Info);
        }
        // Diagnostics belong on stdout; stderr carries only the fatal error.
        let _ = builder
            .format_timestamp_millis()
            .target(env_logger::Target::Stdout)
            .try_init();
    });
}

struct Source<'a> {
    path: &'a Path,
    table: &'static str,
    override_var: &'static str,
}

pub fn run() -> Result<()> {
    init_logging();
    let _cli = Cli::parse();
    let settings = Settings::load().context("Loading configuration")?;

    info!(
        "Connecting to SQL Server at {}:{}",
        settings.server, settings.port
    );
    let mut client = connect::establish(&settings)?;
    info!("Using connection profile: {}", client.profile_name());

    let version = client
        .query_string("SELECT @@VERSION")
        .context("Querying server version")?;
    info!("Connected to SQL Server:\n{version}");

    let sources = [
        Source {
            path: &settings.brand_csv,
            table: "brand",
            override_var: "AZURE_SQL_BRAND_CSV",
        },
        Source {
            path: &settings.spend_csv,
            table: "daily_spend",
            override_var: "AZURE_SQL_SPEND_CSV",
        },
    ];

    for source in &sources {
        if !ensure_exists(source.path, source.override_var) {
            continue;
        }
        info!("Reading {:?}", source.path);
        let snapshot = TableSnapshot::load(source.path)
            .with_context(|| format!("Loading CSV from {:?}", source.path))?;
        info!(
            "Writing {SCHEMA}.{} ({} row(s), {} column(s))",
            source.table,
            snapshot.row_count(),
            snapshot.column_count()
        );
        writer::replace_table(&mut client, SCHEMA, source.table, &snapshot)
            .with_context(|| format!("Writing {SCHEMA}.{}", source.table))?;
    }

    verify::report_row_counts(&mut client, SCHEMA, &["brand", "daily_spend"]);
    info!("Ingestion complete.");
    Ok(())
}

/// Returns true when the source file exists; otherwise warns, naming the
/// environment variable that can point the run at a different path.
fn ensure_exists(path: &Path, override_var: &str) -> bool {
    if path.exists() {
        true
    } else {
        warn!("File not found: {path:?}. Set {override_var} if the path differs.");
        false
    }
}
