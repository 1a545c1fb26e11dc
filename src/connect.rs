//! Connection establishment with profile fallback.
//!
//! Deployment environments differ in how strictly the server certificate can
//! be verified (managed cloud instances present proper certificates, local
//! and proxied servers often do not), so the establisher probes a fixed
//! ordered list of named profiles and keeps the first one that answers a
//! trivial validation query.

use anyhow::{Result, anyhow};
use log::{info, warn};

use crate::db::{ConnectError, DbClient};
use crate::settings::Settings;

/// A named connection strategy the establisher may attempt.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub name: &'static str,
    /// Accept the server certificate without verification.
    pub trust_cert: bool,
}

/// Preference order: verified TLS first, then blind trust for servers with
/// self-signed or proxied certificates.
pub const PROFILES: &[Profile] = &[
    Profile {
        name: "encrypt-verify",
        trust_cert: false,
    },
    Profile {
        name: "encrypt-trust",
        trust_cert: true,
    },
];

/// Tries each profile in order and returns the first working connection.
pub fn establish(settings: &Settings) -> Result<DbClient> {
    first_working(PROFILES, |profile| {
        info!("Trying connection profile: {}", profile.name);
        DbClient::connect(settings, profile)
    })
}

/// Folds over `profiles`, stopping at the first successful attempt. Profiles
/// after the first success are never tried; if every attempt fails, the
/// returned error carries the last failure's description.
fn first_working<T, F>(profiles: &[Profile], mut attempt: F) -> Result<T>
where
    F: FnMut(&Profile) -> Result<T, ConnectError>,
{
    let mut last_err: Option<ConnectError> = None;
    for profile in profiles {
        match attempt(profile) {
            Ok(connection) => return Ok(connection),
            Err(err) => {
                warn!("Connection profile failed: {} -> {err}", profile.name);
                last_err = Some(err);
            }
        }
    }
    Err(match last_err {
        Some(err) => anyhow!("No connection profile succeeded. Last error: {err}"),
        None => anyhow!("No connection profiles configured"),
    })
}
