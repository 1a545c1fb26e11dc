use clap::Parser;

/// Command-line surface of the ingestion binary.
///
/// All configuration is environment-driven (`AZURE_SQL_*` variables with
/// baked-in defaults); the parser exists only so `--help` and `--version`
/// behave like any other CLI.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load CSV files into SQL Server tables, replacing prior contents",
    long_about = None
)]
pub struct Cli {}
