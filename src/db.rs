//! Blocking facade over the async TDS client.
//!
//! The ingestion pipeline is strictly sequential, so every database call is
//! driven to completion on a current-thread runtime owned by [`DbClient`].
//! The client and its runtime live for the duration of `run()` and are
//! released together on drop.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::debug;
use thiserror::Error;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::connect::Profile;
use crate::settings::Settings;

/// Why a single connection attempt failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("TCP connection to {addr} failed: {source}")]
    Tcp {
        addr: String,
        source: std::io::Error,
    },
    #[error("TDS handshake or probe failed: {0}")]
    Tds(#[from] tiberius::error::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

pub struct DbClient {
    runtime: Runtime,
    client: Client<Compat<TcpStream>>,
    profile: &'static str,
}

impl DbClient {
    /// Opens a connection using the given profile and validates it with a
    /// `SELECT 1` probe. The whole attempt, TCP connect through probe, is
    /// bounded by the configured connect timeout.
    pub fn connect(settings: &Settings, profile: &Profile) -> Result<Self, ConnectError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConnectError::Runtime)?;

        let mut config = Config::new();
        config.host(&settings.server);
        config.port(settings.port);
        config.database(&settings.database);
        config.authentication(AuthMethod::sql_server(&settings.user, &settings.password));
        config.encryption(EncryptionLevel::Required);
        if profile.trust_cert {
            config.trust_cert();
        }

        let timeout = Duration::from_secs(settings.connect_timeout_secs);
        let addr = format!("{}:{}", settings.server, settings.port);
        let client = runtime.block_on(async {
            let attempt = async {
                let tcp = TcpStream::connect(config.get_addr())
                    .await
                    .map_err(|source| ConnectError::Tcp {
                        addr: addr.clone(),
                        source,
                    })?;
                tcp.set_nodelay(true).map_err(|source| ConnectError::Tcp {
                    addr: addr.clone(),
                    source,
                })?;
                let mut client = Client::connect(config, tcp.compat_write()).await?;
                client.simple_query("SELECT 1").await?.into_results().await?;
                Ok::<_, ConnectError>(client)
            };
            match tokio::time::timeout(timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(ConnectError::Timeout(timeout)),
            }
        })?;

        Ok(Self {
            runtime,
            client,
            profile: profile.name,
        })
    }

    /// Name of the connection profile this client was established with.
    pub fn profile_name(&self) -> &'static str {
        self.profile
    }

    /// Runs a statement batch that returns no rows (DDL, INSERT).
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("Executing batch of {} byte(s)", sql.len());
        let Self {
            runtime, client, ..
        } = self;
        runtime
            .block_on(async {
                client.simple_query(sql).await?.into_results().await?;
                Ok::<_, tiberius::error::Error>(())
            })
            .context("Executing SQL batch")?;
        Ok(())
    }

    /// Runs a query expected to yield a single textual scalar.
    pub fn query_string(&mut self, sql: &str) -> Result<String> {
        let Self {
            runtime, client, ..
        } = self;
        let row = runtime
            .block_on(async { client.simple_query(sql).await?.into_row().await })
            .with_context(|| format!("Running query: {sql}"))?
            .ok_or_else(|| anyhow!("Query returned no rows: {sql}"))?;
        let value: Option<&str> = row.get(0);
        Ok(value.unwrap_or_default().to_string())
    }

    /// Runs a query expected to yield a single `bigint` scalar.
    pub fn query_count(&mut self, sql: &str) -> Result<i64> {
        let Self {
            runtime, client, ..
        } = self;
        let row = runtime
            .block_on(async { client.simple_query(sql).await?.into_row().await })
            .with_context(|| format!("Running query: {sql}"))?
            .ok_or_else(|| anyhow!("Query returned no rows: {sql}"))?;
        let value: Option<i64> = row.get(0);
        value.ok_or_else(|| anyhow!("Query returned a NULL count: {sql}"))
    }
}
