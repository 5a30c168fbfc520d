//! Provisioning helpers for a GeoServer container.
//!
//! Two idempotent routines run at container startup: rotating the admin
//! password from the factory default over the REST security API, and seeding
//! the data directory from a versioned artifact guarded by a lock marker.
//! Configuration comes from environment variables and is resolved once into a
//! [`Config`] that every routine borrows.

pub mod constants;
pub mod download;
pub mod loader;
pub mod lock;
pub mod models;
pub mod password;
pub mod tasks;
pub mod util;

pub use download::{DownloadError, DownloadOutcome, download_data};
pub use loader::{ConfigLoader, error::ConfigLoadError};
pub use lock::{InitError, LockStamp, stamp_lock_file};
pub use models::{Config, DataConfig, GeoServerConfig, sources::EnvConfig};
pub use password::{
    PasswordConfigurator, PasswordError, PasswordOutcome, RetryPolicy,
};
pub use tasks::{
    ConfigureReport, configure_geoserver, configure_geoserver_with,
};
