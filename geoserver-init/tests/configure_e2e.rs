mod support;

use std::{fs, time::Duration};

use axum::http::StatusCode;
use geoserver_init::{
    PasswordConfigurator, PasswordOutcome, RetryPolicy, configure_geoserver,
    constants::*, password::ReqwestTransport,
};
use support::{FakeGeoServer, InstantSleeper, closed_addr, config_from};

#[tokio::test]
async fn rotates_password_then_stamps_madrid_time() {
    let root = tempfile::tempdir().expect("tempdir");
    let data_dir = root.path().join("x");
    let server = FakeGeoServer::new(StatusCode::OK);
    let addr = server.start().await;
    let port = addr.port().to_string();
    let config = config_from(&[
        (GEOSERVER_LB_HOST_IP, "127.0.0.1"),
        (GEOSERVER_LB_PORT, port.as_str()),
        (GEOSERVER_DATA_DIR, data_dir.to_str().expect("utf8 path")),
        (TIME_ZONE, "Europe/Madrid"),
    ]);
    let configurator = PasswordConfigurator::new(
        ReqwestTransport::new(reqwest::Client::new()),
        InstantSleeper::default(),
    );

    let report = configure_geoserver(&config, &configurator).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(server.recorded().len(), 1);
    let stamp = report.lock.expect("stamped");
    assert!(!stamp.fell_back);
    let contents = fs::read_to_string(data_dir.join(LOCK_FILE_NAME)).unwrap();
    assert!(
        contents.contains(" CET ") || contents.contains(" CEST "),
        "unexpected lock contents {contents:?}"
    );
}

#[tokio::test]
async fn unreachable_geoserver_still_stamps_lock() {
    let root = tempfile::tempdir().expect("tempdir");
    let port = closed_addr().port().to_string();
    let config = config_from(&[
        (GEOSERVER_LB_HOST_IP, "127.0.0.1"),
        (GEOSERVER_LB_PORT, port.as_str()),
        (GEOSERVER_DATA_DIR, root.path().to_str().expect("utf8 path")),
        (TIME_ZONE, "Not/AZone"),
    ]);
    let configurator = PasswordConfigurator::new(
        ReqwestTransport::new(reqwest::Client::new()),
        InstantSleeper::default(),
    )
    .with_policy(RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(1),
    });

    let report = configure_geoserver(&config, &configurator).await;

    assert!(!report.is_success());
    assert!(matches!(
        report.password,
        Ok(PasswordOutcome::Unreachable { attempts: 2 })
    ));
    let stamp = report.lock.expect("stamped");
    assert!(stamp.fell_back);
    assert!(stamp.contents.contains(" UTC "));
    assert!(root.path().join(LOCK_FILE_NAME).is_file());
}
