//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod billing;
pub mod database;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::billing::BillingConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::{StorageBackend, StorageConfig};

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "PARKEASE";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML files
/// (base file + environment overlay + `PARKEASE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Billing defaults.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file at `path` is optional. When `PARKEASE_ENV` is set, the
    /// sibling `config/{env}.toml` is layered on top, and finally
    /// environment variables such as `PARKEASE__DATABASE__URL` win.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let env = std::env::var("PARKEASE_ENV").ok();
        Self::load_with_env(path, env.as_deref())
    }

    /// Load configuration with an explicit environment overlay name.
    pub fn load_with_env(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        debug!(path, env = env.unwrap_or("-"), "Loading configuration");

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
