//! Seed the GeoServer data directory from the published data artifact.
//!
//! The lock marker makes this a one-shot operation: once it exists nothing is
//! touched unless `FORCE_REINIT` is set. A forced or first run wipes the data
//! directory before downloading, so a failure part-way leaves it empty and
//! without a marker. The next run starts over from scratch.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use zip::{ZipArchive, result::ZipError};

use crate::{
    DataConfig,
    constants::{ARCHIVE_DATA_SUBDIR, SEEDED_LOCK_CONTENTS},
    util::{clear_dir, copy_dir_contents},
};

/// Why seeding stopped.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The temp directory could not be created.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Wiping the data directory failed.
    #[error("failed to clear data directory {path}")]
    ClearDataDir {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// No response, or the body stream broke.
    #[error("request to {url} failed")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx answer from the artifact server.
    #[error("artifact server answered {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// Saving the archive to disk failed.
    #[error("failed to write archive {path}")]
    WriteArchive {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The archive is not a readable zip.
    #[error("failed to read archive {path}")]
    Archive {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ZipError,
    },
    /// An entry path points outside the extraction directory.
    #[error("archive entry '{name}' escapes the extraction directory")]
    UnsafeEntry {
        /// Entry name as stored in the archive.
        name: String,
    },
    /// Writing an extracted entry failed.
    #[error("failed to extract {path}")]
    Extract {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The unpacked archive lacks the `data/` subtree.
    #[error("archive has no data directory at {path}")]
    MissingDataDir {
        /// Expected location of the subtree.
        path: PathBuf,
    },
    /// Copying the seed tree into the data directory failed.
    #[error("failed to copy {from} into {to}")]
    Copy {
        /// Unpacked `data/` subtree.
        from: PathBuf,
        /// Data directory.
        to: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The marker could not be written.
    #[error("failed to write lock file {path}")]
    WriteLock {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A blocking filesystem task panicked or was cancelled.
    #[error("background task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// What `download_data` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The lock marker was present and no re-seed was forced.
    AlreadyInitialized {
        /// The marker that was found.
        lock_file: PathBuf,
    },
    /// The data directory was rebuilt from the artifact.
    Seeded {
        /// Where the archive came from.
        artifact_url: String,
        /// Archive size.
        bytes_downloaded: u64,
        /// Regular files copied into the data directory.
        files_copied: usize,
    },
}

/// Seed `config.data_dir` unless it is already initialized.
///
/// Runs the full sequence: temp dir, lock check, wipe, download, unpack,
/// copy, marker.
pub async fn download_data(
    config: &DataConfig,
    client: &Client,
) -> Result<DownloadOutcome, DownloadError> {
    let artifact_url = config.artifact_url();
    let temp_dir = config.temp_download_dir.clone();
    let data_dir = config.data_dir.clone();

    tokio::fs::create_dir_all(&temp_dir).await.map_err(|source| {
        DownloadError::CreateDir {
            path: temp_dir.clone(),
            source,
        }
    })?;

    let lock_file = config.lock_file_path();
    if !config.force_reinit && config.is_initialized() {
        info!(
            "GeoServer data directory already initialized ({})",
            lock_file.display()
        );
        return Ok(DownloadOutcome::AlreadyInitialized { lock_file });
    }
    if config.force_reinit {
        warn!("FORCE_REINIT set; re-seeding {}", data_dir.display());
    }

    let wipe_dir = data_dir.clone();
    let removed = tokio::task::spawn_blocking(move || wipe(&wipe_dir)).await??;
    info!("cleared {removed} entries from {}", data_dir.display());

    let archive_path = config.archive_path();
    let bytes_downloaded =
        fetch_artifact(client, &artifact_url, &archive_path).await?;
    info!("downloaded {bytes_downloaded} bytes from {artifact_url}");

    let files_copied = tokio::task::spawn_blocking(move || {
        let entries = unpack_archive(&archive_path, &temp_dir)?;
        debug!("unpacked {entries} entries into {}", temp_dir.display());
        copy_seed_data(&temp_dir.join(ARCHIVE_DATA_SUBDIR), &data_dir)
    })
    .await??;

    tokio::fs::write(&lock_file, SEEDED_LOCK_CONTENTS)
        .await
        .map_err(|source| DownloadError::WriteLock {
            path: lock_file.clone(),
            source,
        })?;
    info!("GeoServer data directory seeded ({files_copied} files)");

    Ok(DownloadOutcome::Seeded {
        artifact_url,
        bytes_downloaded,
        files_copied,
    })
}

fn wipe(data_dir: &Path) -> Result<usize, DownloadError> {
    fs::create_dir_all(data_dir).map_err(|source| DownloadError::CreateDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    clear_dir(data_dir).map_err(|source| DownloadError::ClearDataDir {
        path: data_dir.to_path_buf(),
        source,
    })
}

/// Stream `url` into `dest` chunk by chunk. Returns the byte count.
pub async fn fetch_artifact(
    client: &Client,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let request_error = |source: reqwest::Error| DownloadError::Request {
        url: url.to_string(),
        source,
    };
    let write_error = |source: io::Error| DownloadError::WriteArchive {
        path: dest.to_path_buf(),
        source,
    };

    info!("downloading {url}");
    let response = client.get(url).send().await.map_err(request_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(request_error)?;
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_error)?;
    Ok(written)
}

/// Extract every entry of the zip at `archive_path` under `dest`,
/// overwriting existing files. Returns the number of entries written.
pub fn unpack_archive(
    archive_path: &Path,
    dest: &Path,
) -> Result<usize, DownloadError> {
    let archive_error = |source: ZipError| DownloadError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };
    let file = File::open(archive_path).map_err(|source| {
        DownloadError::Extract {
            path: archive_path.to_path_buf(),
            source,
        }
    })?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(DownloadError::UnsafeEntry {
                name: entry.name().to_string(),
            });
        };
        let target = dest.join(relative);
        let extract_error = |source: io::Error| DownloadError::Extract {
            path: target.clone(),
            source,
        };

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(extract_error)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(extract_error)?;
        }
        let mut out = File::create(&target).map_err(extract_error)?;
        io::copy(&mut entry, &mut out).map_err(extract_error)?;
    }
    Ok(archive.len())
}

fn copy_seed_data(source: &Path, data_dir: &Path) -> Result<usize, DownloadError> {
    if !source.is_dir() {
        return Err(DownloadError::MissingDataDir {
            path: source.to_path_buf(),
        });
    }
    copy_dir_contents(source, data_dir).map_err(|err| DownloadError::Copy {
        from: source.to_path_buf(),
        to: data_dir.to_path_buf(),
        source: err,
    })
}
