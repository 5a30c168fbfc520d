//! Raw environment snapshot.

use std::path::PathBuf;

use crate::{constants::*, util::non_blank};

/// Raw configuration captured from the process environment.
///
/// Every field is optional; defaults are applied by [`crate::ConfigLoader`].
/// Blank values are treated as unset.
#[derive(Default, Clone)]
pub struct EnvConfig {
    /// `GEOSERVER_LB_PORT`
    pub lb_port: Option<String>,
    /// `GEOSERVER_ADMIN_USER`
    pub admin_user: Option<String>,
    /// `GEOSERVER_ADMIN_PASSWORD`
    pub admin_password: Option<String>,
    /// `GEOSERVER_FACTORY_PASSWORD`
    pub factory_password: Option<String>,
    /// `GEOSERVER_LB_HOST_IP`
    pub lb_host_ip: Option<String>,
    /// `GEOSERVER_HTTP_PROTOCOL`
    pub http_protocol: Option<String>,
    /// `SITEURL`
    pub site_url: Option<String>,
    /// `GEOSERVER_DATA_DIR`
    pub data_dir: Option<PathBuf>,
    /// `TIME_ZONE`
    pub time_zone: Option<String>,
    /// `TEMP_DOWNLOAD_DATA`
    pub temp_download_dir: Option<PathBuf>,
    /// `GEOSERVER_VERSION`
    pub geoserver_version: Option<String>,
    /// `FORCE_REINIT`
    pub force_reinit: Option<String>,
    /// `GEOSERVER_ARTIFACTS_URL`
    pub artifacts_url: Option<String>,
}

impl EnvConfig {
    /// Read the live process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));
        Self {
            lb_port: get(GEOSERVER_LB_PORT),
            admin_user: get(GEOSERVER_ADMIN_USER),
            admin_password: get(GEOSERVER_ADMIN_PASSWORD),
            factory_password: get(GEOSERVER_FACTORY_PASSWORD),
            lb_host_ip: get(GEOSERVER_LB_HOST_IP),
            http_protocol: get(GEOSERVER_HTTP_PROTOCOL),
            site_url: get(SITEURL),
            data_dir: get(GEOSERVER_DATA_DIR).map(PathBuf::from),
            time_zone: get(TIME_ZONE),
            temp_download_dir: get(TEMP_DOWNLOAD_DATA).map(PathBuf::from),
            geoserver_version: get(GEOSERVER_VERSION),
            force_reinit: get(FORCE_REINIT),
            artifacts_url: get(GEOSERVER_ARTIFACTS_URL),
        }
    }
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("EnvConfig")
            .field("lb_port", &self.lb_port)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &redact(&self.admin_password))
            .field("factory_password", &redact(&self.factory_password))
            .field("lb_host_ip", &self.lb_host_ip)
            .field("http_protocol", &self.http_protocol)
            .field("site_url", &self.site_url)
            .field("data_dir", &self.data_dir)
            .field("time_zone", &self.time_zone)
            .field("temp_download_dir", &self.temp_download_dir)
            .field("geoserver_version", &self.geoserver_version)
            .field("force_reinit", &self.force_reinit)
            .field("artifacts_url", &self.artifacts_url)
            .finish()
    }
}
