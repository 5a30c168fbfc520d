//! Resolved configuration types.

pub mod sources;

use std::path::PathBuf;

use crate::constants::{ARTIFACT_FILE_NAME, LOCK_FILE_NAME};

/// Fully resolved configuration, built once at startup by
/// [`crate::ConfigLoader`] and passed by reference into each routine.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST connection and credentials.
    pub geoserver: GeoServerConfig,
    /// Data directory seeding.
    pub data: DataConfig,
}

/// Where GeoServer's REST API lives and which credentials to rotate.
#[derive(Clone)]
pub struct GeoServerConfig {
    /// Account whose password is rotated.
    pub admin_user: String,
    /// Password to set.
    pub admin_password: String,
    /// Password the instance ships with; used to authenticate the change.
    pub factory_password: String,
    /// Host used when no site URL is set.
    pub host: String,
    /// Port used when no site URL is set.
    pub port: u16,
    /// `http` or `https`.
    pub protocol: String,
    /// Public site URL; when present it replaces protocol/host/port.
    pub site_url: Option<String>,
}

impl std::fmt::Debug for GeoServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoServerConfig")
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"<redacted>")
            .field("factory_password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("site_url", &self.site_url)
            .finish()
    }
}

/// Data directory seeding settings.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// GeoServer data directory; holds the lock file.
    pub data_dir: PathBuf,
    /// Scratch space for the archive and its unpacked tree.
    pub temp_download_dir: PathBuf,
    /// Version segment of the artifact URL, e.g. `2.27.x`.
    pub geoserver_version: String,
    /// Reseed even when the lock file exists.
    pub force_reinit: bool,
    /// IANA identifier as configured; validated when the lock is stamped.
    pub time_zone: String,
    /// Root of the artifact server, without the version segment.
    pub artifacts_base_url: String,
}

impl DataConfig {
    /// `<data_dir>/geoserver_init.lock`.
    pub fn lock_file_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE_NAME)
    }

    /// Whether the lock file is present.
    pub fn is_initialized(&self) -> bool {
        self.lock_file_path().exists()
    }

    /// Full URL of the versioned seed archive.
    pub fn artifact_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.artifacts_base_url.trim_end_matches('/'),
            self.geoserver_version,
            ARTIFACT_FILE_NAME
        )
    }

    /// Location of the downloaded archive inside the temp directory.
    pub fn archive_path(&self) -> PathBuf {
        self.temp_download_dir.join(ARTIFACT_FILE_NAME)
    }
}
