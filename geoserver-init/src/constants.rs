//! Environment variable names and their defaults.

use std::time::Duration;

/// GeoServer port when `SITEURL` is unset.
pub const GEOSERVER_LB_PORT: &str = "GEOSERVER_LB_PORT";
/// Account whose password is rotated.
pub const GEOSERVER_ADMIN_USER: &str = "GEOSERVER_ADMIN_USER";
/// Password to set.
pub const GEOSERVER_ADMIN_PASSWORD: &str = "GEOSERVER_ADMIN_PASSWORD";
/// Password the image ships with.
pub const GEOSERVER_FACTORY_PASSWORD: &str = "GEOSERVER_FACTORY_PASSWORD";
/// GeoServer host when `SITEURL` is unset.
pub const GEOSERVER_LB_HOST_IP: &str = "GEOSERVER_LB_HOST_IP";
/// `http` or `https`.
pub const GEOSERVER_HTTP_PROTOCOL: &str = "GEOSERVER_HTTP_PROTOCOL";
/// Public site URL; replaces protocol, host and port.
pub const SITEURL: &str = "SITEURL";
/// Data directory to seed and stamp.
pub const GEOSERVER_DATA_DIR: &str = "GEOSERVER_DATA_DIR";
/// IANA zone for the lock stamp.
pub const TIME_ZONE: &str = "TIME_ZONE";
/// Scratch directory for the archive.
pub const TEMP_DOWNLOAD_DATA: &str = "TEMP_DOWNLOAD_DATA";
/// Artifact version segment.
pub const GEOSERVER_VERSION: &str = "GEOSERVER_VERSION";
/// `true` or `1` reseeds an initialized data directory.
pub const FORCE_REINIT: &str = "FORCE_REINIT";
/// Artifact server root.
pub const GEOSERVER_ARTIFACTS_URL: &str = "GEOSERVER_ARTIFACTS_URL";

/// Every variable the loader consults, in documentation order.
pub const ENV_KEYS: &[&str] = &[
    GEOSERVER_LB_PORT,
    GEOSERVER_ADMIN_USER,
    GEOSERVER_ADMIN_PASSWORD,
    GEOSERVER_FACTORY_PASSWORD,
    GEOSERVER_LB_HOST_IP,
    GEOSERVER_HTTP_PROTOCOL,
    SITEURL,
    GEOSERVER_DATA_DIR,
    TIME_ZONE,
    TEMP_DOWNLOAD_DATA,
    GEOSERVER_VERSION,
    FORCE_REINIT,
    GEOSERVER_ARTIFACTS_URL,
];

/// Default for [`GEOSERVER_LB_PORT`].
pub const DEFAULT_PORT: u16 = 8080;
/// Default for [`GEOSERVER_ADMIN_USER`].
pub const DEFAULT_ADMIN_USER: &str = "admin";
/// Default for [`GEOSERVER_ADMIN_PASSWORD`].
pub const DEFAULT_ADMIN_PASSWORD: &str = "geoserver";
/// Default for [`GEOSERVER_FACTORY_PASSWORD`].
pub const DEFAULT_FACTORY_PASSWORD: &str = "geoserver";
/// Default for [`GEOSERVER_LB_HOST_IP`].
pub const DEFAULT_HOST: &str = "localhost";
/// Default for [`GEOSERVER_HTTP_PROTOCOL`].
pub const DEFAULT_PROTOCOL: &str = "http";
/// Default for [`GEOSERVER_DATA_DIR`].
pub const DEFAULT_DATA_DIR: &str = "/geoserver_data/data/";
/// Default for [`TIME_ZONE`].
pub const DEFAULT_TIME_ZONE: &str = "UTC";
/// Default for [`TEMP_DOWNLOAD_DATA`].
pub const DEFAULT_TEMP_DOWNLOAD_DIR: &str = "/tmp/geonode/download_data";
/// Default for [`GEOSERVER_VERSION`].
pub const DEFAULT_GEOSERVER_VERSION: &str = "2.27.x";
/// Default for [`GEOSERVER_ARTIFACTS_URL`].
pub const DEFAULT_ARTIFACTS_URL: &str =
    "https://artifacts.geonode.org/geoserver";

/// Name of the marker file placed in the data directory once it is seeded.
pub const LOCK_FILE_NAME: &str = "geoserver_init.lock";
/// Archive file name, both on the artifact server and in the temp directory.
pub const ARTIFACT_FILE_NAME: &str = "geonode-geoserver-ext-web-app-data.zip";
/// Subtree of the unpacked archive that is copied into the data directory.
pub const ARCHIVE_DATA_SUBDIR: &str = "data";
/// Written into the lock file after a successful seed.
pub const SEEDED_LOCK_CONTENTS: &str = "GeoServer data directory initialized\n";

/// REST root below the site or host.
pub const REST_PATH: &str = "geoserver/rest";
/// Endpoint that changes the caller's own password.
pub const SELF_PASSWORD_PATH: &str = "security/self/password";

/// Requests sent before giving up on an unreachable GeoServer.
pub const PASSWORD_MAX_ATTEMPTS: u32 = 28;
/// Pause after each failed request.
pub const PASSWORD_RETRY_DELAY: Duration = Duration::from_secs(2);
