//! # Configuration
//!
//! Settings are read once at startup and handed to the store and session
//! constructors explicitly.
//!
//! ## Environment Variables
//!
//! - `CASETA_APP_ID`: namespace of the reservation and admin collections (required)
//! - `DATABASE_URL`: PostgreSQL connection string of the document store (required)
//! - `CASETA_MASTER_ID`: member id of the master identity (required)
//! - `CASETA_MASTER_PASSWORD`: password of the master identity (required)
//! - `CASETA_AUTH_TOKEN`: custom sign-in token; anonymous sign-in when unset
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `CASETA_SWEEP_INTERVAL_SECONDS`: expiry sweep period (default: 3600)

use std::env;
use std::time::Duration;

use tracing::Level;

use crate::access::MasterCredential;
use crate::errors::{CasetaError, CasetaResult};

const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct CasetaConfig {
    /// Namespace of both collections inside the document store
    pub app_id: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// The privileged identity that bypasses the admin directory
    pub master: MasterCredential,

    /// Custom sign-in token (optional)
    pub auth_token: Option<String>,

    /// Log level for the application
    pub log_level: Level,

    /// How often the sweeper re-checks pending reservations for expiry
    pub sweep_interval: Duration,
}

impl CasetaConfig {
    /// Creates a new CasetaConfig from environment variables
    ///
    /// # Errors
    ///
    /// Returns [CasetaError::Configuration] if a required variable is missing
    /// or blank, or if `CASETA_SWEEP_INTERVAL_SECONDS` is not a positive
    /// integer.
    pub fn from_env() -> CasetaResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [Self::from_env], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> CasetaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    CasetaError::Configuration(format!("{} environment variable must be set", key))
                })
        };

        let app_id = required("CASETA_APP_ID")?;
        let database_url = required("DATABASE_URL")?;
        let master = MasterCredential::new(
            required("CASETA_MASTER_ID")?,
            required("CASETA_MASTER_PASSWORD")?,
        );

        let auth_token = lookup("CASETA_AUTH_TOKEN").filter(|token| !token.trim().is_empty());

        let log_level = match lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let sweep_interval = match lookup("CASETA_SWEEP_INTERVAL_SECONDS") {
            None => Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(CasetaError::Configuration(format!(
                        "Invalid CASETA_SWEEP_INTERVAL_SECONDS value '{}'",
                        raw
                    )));
                }
            },
        };

        Ok(Self {
            app_id,
            database_url,
            master,
            auth_token,
            log_level,
            sweep_interval,
        })
    }
}
