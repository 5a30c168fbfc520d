//! Command-line entry point run by the container's startup scripts.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geoserver_init::{
    ConfigLoader, DownloadOutcome, PasswordConfigurator, PasswordOutcome,
    download_data,
    tasks::{self, http_client},
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "geoserver-init",
    version,
    about = "GeoServer container provisioning"
)]
struct Cli {
    /// Load variables from this dotenv file before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    /// Exit non-zero when a task fails instead of only logging it
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rotate the admin password, then stamp the init lock file
    #[command(alias = "configure_geoserver")]
    ConfigureGeoserver,
    /// Seed the data directory from the published artifact, once
    #[command(alias = "download_data")]
    DownloadData,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let (loader, env_ok) =
        match ConfigLoader::with_env_file(cli.env_file.as_deref()) {
            Ok(loader) => (loader, true),
            Err(e) => {
                error!(
                    "environment file not loaded, using process environment: {}",
                    error_chain(&e)
                );
                (ConfigLoader::from_env(), false)
            }
        };
    let data = loader.load_data();
    let client = http_client().context("failed to build HTTP client")?;

    let ok = match cli.command {
        Command::ConfigureGeoserver => {
            let configurator = PasswordConfigurator::with_client(client);
            let report = tasks::configure_geoserver_with(
                loader.load_geoserver(),
                &data,
                &configurator,
            )
            .await;

            match &report.password {
                Ok(PasswordOutcome::Updated { attempts }) => {
                    info!("password rotated after {attempts} attempt(s)")
                }
                Ok(PasswordOutcome::Rejected { status, .. }) => {
                    warn!("password change rejected with HTTP {status}")
                }
                Ok(PasswordOutcome::Unreachable { attempts }) => {
                    warn!("GeoServer unreachable after {attempts} attempts")
                }
                Err(e) => error!("password change failed: {}", error_chain(e)),
            }
            match &report.lock {
                Ok(stamp) if stamp.fell_back => warn!(
                    "lock file {} stamped in UTC (invalid TIME_ZONE '{}')",
                    stamp.path.display(),
                    data.time_zone
                ),
                Ok(stamp) => info!("lock file {} stamped", stamp.path.display()),
                Err(e) => error!("init file not stamped: {}", error_chain(e)),
            }
            report.is_success()
        }
        Command::DownloadData => {
            match download_data(&data, &client).await {
                Ok(DownloadOutcome::AlreadyInitialized { .. }) => true,
                Ok(DownloadOutcome::Seeded { files_copied, .. }) => {
                    info!("seeded {files_copied} files");
                    true
                }
                Err(e) => {
                    error!("data download failed: {}", error_chain(&e));
                    false
                }
            }
        }
    };

    if !(ok && env_ok) && cli.strict {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Render an error with its `source()` chain, `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
