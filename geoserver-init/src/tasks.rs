//! The two provisioning tasks exposed on the command line.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::{
    Config, ConfigLoadError, DataConfig, GeoServerConfig,
    lock::{self, InitError, LockStamp},
    password::{
        PasswordConfigurator, PasswordError, PasswordOutcome, RestTransport,
        Sleeper,
    },
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client. Only connecting is bounded; archive downloads may take
/// arbitrarily long.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
}

/// Result of `configure_geoserver`. Both steps always run.
#[derive(Debug)]
pub struct ConfigureReport {
    /// Password rotation result.
    pub password: Result<PasswordOutcome, PasswordError>,
    /// Lock stamp result.
    pub lock: Result<LockStamp, InitError>,
}

impl ConfigureReport {
    /// Password updated and lock stamped.
    pub fn is_success(&self) -> bool {
        matches!(self.password, Ok(PasswordOutcome::Updated { .. }))
            && self.lock.is_ok()
    }
}

/// Rotate the admin password, then stamp the lock file.
pub async fn configure_geoserver<T, S>(
    config: &Config,
    configurator: &PasswordConfigurator<T, S>,
) -> ConfigureReport
where
    T: RestTransport,
    S: Sleeper,
{
    configure_geoserver_with(
        Ok(config.geoserver.clone()),
        &config.data,
        configurator,
    )
    .await
}

/// Like [`configure_geoserver`], for GeoServer settings that failed to
/// resolve. The load error is reported as the password result and the lock
/// is stamped regardless.
pub async fn configure_geoserver_with<T, S>(
    geoserver: Result<GeoServerConfig, ConfigLoadError>,
    data: &DataConfig,
    configurator: &PasswordConfigurator<T, S>,
) -> ConfigureReport
where
    T: RestTransport,
    S: Sleeper,
{
    let password = match geoserver {
        Ok(geoserver) => configurator.run(&geoserver).await,
        Err(err) => {
            warn!("skipping password change: {err}");
            Err(PasswordError::from(err))
        }
    };

    info!("stamping init file");
    let lock = lock::stamp_lock_file(data);

    ConfigureReport { password, lock }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::{MockRestTransport, MockSleeper};

    #[tokio::test]
    async fn invalid_settings_skip_the_request_but_still_stamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = DataConfig {
            data_dir: dir.path().join("data"),
            temp_download_dir: dir.path().join("tmp"),
            geoserver_version: "2.27.x".into(),
            force_reinit: false,
            time_zone: "UTC".into(),
            artifacts_base_url: "http://unused".into(),
        };
        let mut transport = MockRestTransport::new();
        transport.expect_put_password().never();
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();
        let configurator = PasswordConfigurator::new(transport, sleeper);
        let err = ConfigLoadError::InvalidProtocol {
            key: crate::constants::GEOSERVER_HTTP_PROTOCOL,
            value: "ftp".into(),
        };

        let report =
            configure_geoserver_with(Err(err), &data, &configurator).await;

        assert!(matches!(report.password, Err(PasswordError::Config(_))));
        assert!(!report.is_success());
        let stamp = report.lock.expect("stamped");
        assert!(stamp.contents.contains(" UTC "));
        assert!(data.lock_file_path().is_file());
    }
}
