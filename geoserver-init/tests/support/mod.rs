#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::{Cursor, Write},
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, put},
};
use geoserver_init::{Config, ConfigLoader, EnvConfig, password::Sleeper};
use zip::{ZipWriter, write::SimpleFileOptions};

pub const ARTIFACT_PATH: &str =
    "/geoserver/2.27.x/geonode-geoserver-ext-web-app-data.zip";

/// Serve `router` on an ephemeral localhost port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

/// A localhost address with nothing listening on it.
pub fn closed_addr() -> SocketAddr {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
pub struct FakeGeoServer {
    status: StatusCode,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeGeoServer {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn start(&self) -> SocketAddr {
        let router = Router::new()
            .route(
                "/geoserver/rest/security/self/password",
                put(change_password),
            )
            .with_state(self.clone());
        spawn(router).await
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

async fn change_password(
    State(server): State<FakeGeoServer>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    server
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest { headers, body });
    server.status
}

#[derive(Clone)]
pub struct FakeArtifactServer {
    archive: Arc<Vec<u8>>,
    status: StatusCode,
    pub hits: Arc<AtomicUsize>,
}

impl FakeArtifactServer {
    pub fn new(archive: Vec<u8>) -> Self {
        Self {
            archive: Arc::new(archive),
            status: StatusCode::OK,
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            archive: Arc::new(Vec::new()),
            status,
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the base URL to use as `GEOSERVER_ARTIFACTS_URL`.
    pub async fn start(&self) -> String {
        let router = Router::new()
            .route(ARTIFACT_PATH, get(serve_archive))
            .with_state(self.clone());
        let addr = spawn(router).await;
        format!("http://{addr}/geoserver")
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_archive(
    State(server): State<FakeArtifactServer>,
) -> (StatusCode, Vec<u8>) {
    server.hits.fetch_add(1, Ordering::SeqCst);
    (server.status, server.archive.as_ref().clone())
}

/// Build an in-memory zip with the given `(name, contents)` entries.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(contents.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Resolve a [`Config`] from explicit variables only.
pub fn config_from(vars: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new(EnvConfig::from_lookup(|k| map.get(k).cloned()))
        .load()
        .expect("config loads")
}

/// Records requested delays without waiting.
#[derive(Debug, Clone, Default)]
pub struct InstantSleeper {
    pub slept: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().expect("sleep lock").push(duration);
    }
}
