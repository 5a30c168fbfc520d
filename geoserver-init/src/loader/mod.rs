//! Resolve raw environment input into a typed [`Config`].

pub mod error;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    Config, DataConfig, GeoServerConfig, constants::*,
    models::sources::EnvConfig,
};

use error::ConfigLoadError;

/// Builds a [`Config`] from an [`EnvConfig`] snapshot.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env: EnvConfig,
}

impl ConfigLoader {
    /// Wrap an existing snapshot.
    pub fn new(env: EnvConfig) -> Self {
        Self { env }
    }

    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        Self::new(EnvConfig::gather())
    }

    /// Load a dotenv file into the process environment before snapshotting.
    ///
    /// An explicit path must exist. Without one, a `.env` in the working
    /// directory is used when present.
    pub fn with_env_file(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        match path {
            Some(path) => {
                dotenvy::from_path(path)?;
                debug!("loaded environment from {}", path.display());
            }
            None => {
                if let Ok(path) = dotenvy::dotenv() {
                    debug!("loaded environment from {}", path.display());
                }
            }
        }
        Ok(Self::from_env())
    }

    /// Resolve both halves, failing on the first invalid GeoServer setting.
    pub fn load(&self) -> Result<Config, ConfigLoadError> {
        Ok(Config {
            geoserver: self.load_geoserver()?,
            data: self.load_data(),
        })
    }

    /// Resolve the REST connection settings.
    ///
    /// Credentials are passed through verbatim; only addressing fields are
    /// trimmed.
    pub fn load_geoserver(&self) -> Result<GeoServerConfig, ConfigLoadError> {
        let env = &self.env;
        let port = match env.lb_port.as_deref() {
            Some(raw) => raw.trim().parse::<u16>().map_err(|source| {
                ConfigLoadError::InvalidPort {
                    key: GEOSERVER_LB_PORT,
                    value: raw.to_string(),
                    source,
                }
            })?,
            None => DEFAULT_PORT,
        };

        let protocol = env
            .http_protocol
            .as_deref()
            .map(|p| p.trim().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
        if protocol != "http" && protocol != "https" {
            return Err(ConfigLoadError::InvalidProtocol {
                key: GEOSERVER_HTTP_PROTOCOL,
                value: protocol,
            });
        }

        Ok(GeoServerConfig {
            admin_user: verbatim_or_default(
                &env.admin_user,
                DEFAULT_ADMIN_USER,
            ),
            admin_password: verbatim_or_default(
                &env.admin_password,
                DEFAULT_ADMIN_PASSWORD,
            ),
            factory_password: verbatim_or_default(
                &env.factory_password,
                DEFAULT_FACTORY_PASSWORD,
            ),
            host: or_default(&env.lb_host_ip, DEFAULT_HOST),
            port,
            protocol,
            site_url: env.site_url.clone(),
        })
    }

    /// Resolve the data directory settings. Never fails: nothing here is
    /// validated beyond the `FORCE_REINIT` flag.
    pub fn load_data(&self) -> DataConfig {
        let env = &self.env;
        let force_reinit = env
            .force_reinit
            .as_deref()
            .is_some_and(force_reinit_requested);

        DataConfig {
            data_dir: env
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            temp_download_dir: env
                .temp_download_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DOWNLOAD_DIR)),
            geoserver_version: or_default(
                &env.geoserver_version,
                DEFAULT_GEOSERVER_VERSION,
            ),
            force_reinit,
            time_zone: or_default(&env.time_zone, DEFAULT_TIME_ZONE),
            artifacts_base_url: or_default(
                &env.artifacts_url,
                DEFAULT_ARTIFACTS_URL,
            ),
        }
    }
}

/// Only `true` and `1` (any case) force a reseed. Anything else leaves an
/// initialized data directory alone.
fn force_reinit_requested(raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "" | "false" | "0" => false,
        _ => {
            warn!("{FORCE_REINIT}='{raw}' is neither true nor 1; not forcing");
            false
        }
    }
}

fn verbatim_or_default(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .unwrap_or(default)
        .to_string()
}
