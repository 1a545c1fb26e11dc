//! Runtime configuration, resolved once at startup.
//!
//! Program defaults are merged first, then any `AZURE_SQL_*` environment
//! variables override them (`AZURE_SQL_SERVER`, `AZURE_SQL_BRAND_CSV`, and
//! so on). The resolved [`Settings`] value is passed explicitly to the
//! connection establisher and the loader call sites; nothing reads the
//! environment ad hoc after startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQL Server host name or address.
    pub server: String,
    /// TDS port, 1433 unless the server is non-standard.
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Source CSV destined for `dbo.brand`.
    pub brand_csv: PathBuf,
    /// Source CSV destined for `dbo.daily_spend`.
    pub spend_csv: PathBuf,
    /// Upper bound on each connection attempt, in seconds.
    pub connect_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .set_default("server", "localhost")?
            .set_default("port", 1433_i64)?
            .set_default("database", "hwdbms")?
            .set_default("user", "hwdbms")?
            .set_default("password", "")?
            .set_default("brand_csv", "data/brand.csv")?
            .set_default("spend_csv", "data/daily_spend.csv")?
            .set_default("connect_timeout_secs", 30_i64)?
            .add_source(Environment::with_prefix("AZURE_SQL"))
            .build()
            .context("Building configuration")?;
        config
            .try_deserialize()
            .context("Deserializing configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment_overrides() {
        let settings = Settings::load().expect("load settings");
        assert_eq!(settings.server, "localhost");
        assert_eq!(settings.port, 1433);
        assert_eq!(settings.database, "hwdbms");
        assert_eq!(settings.brand_csv, PathBuf::from("data/brand.csv"));
        assert_eq!(settings.spend_csv, PathBuf::from("data/daily_spend.csv"));
        assert_eq!(settings.connect_timeout_secs, 30);
    }
}
