//! Lock marker stamping.
//!
//! The marker at `<data-dir>/geoserver_init.lock` tells later runs that the
//! data directory is seeded. Stamping always overwrites it with the current
//! time in the configured zone.

use std::{fs, io, path::PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, warn};

use crate::DataConfig;

/// Same layout as `date(1)` in the C locale.
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Why the lock file could not be stamped.
#[derive(Debug, Error)]
pub enum InitError {
    /// The data directory is missing and could not be created.
    #[error("failed to create data directory {path}")]
    CreateDir {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Writing the lock file failed.
    #[error("failed to write lock file {path}")]
    Write {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// The zone used for stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneChoice {
    /// Resolved zone.
    pub tz: Tz,
    /// The configured name was not a known zone and UTC was used instead.
    pub fell_back: bool,
}

/// Result of a successful stamp.
#[derive(Debug, Clone)]
pub struct LockStamp {
    /// Lock file written.
    pub path: PathBuf,
    /// Zone the timestamp is rendered in.
    pub time_zone: Tz,
    /// `TIME_ZONE` was invalid and UTC was used.
    pub fell_back: bool,
    /// Exact bytes written, trailing newline included.
    pub contents: String,
}

/// Parse an IANA zone name, falling back to UTC with a warning.
pub fn resolve_time_zone(name: &str) -> TimeZoneChoice {
    match name.trim().parse::<Tz>() {
        Ok(tz) => {
            info!("valid time zone: {}", tz.name());
            TimeZoneChoice {
                tz,
                fell_back: false,
            }
        }
        Err(_) => {
            warn!("invalid time zone '{name}', using UTC");
            TimeZoneChoice {
                tz: chrono_tz::UTC,
                fell_back: true,
            }
        }
    }
}

/// Format `now` in `tz` like `date(1)`.
pub fn render_timestamp(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format(DATE_FORMAT).to_string()
}

/// Overwrite the lock file with the current time.
pub fn stamp_lock_file(config: &DataConfig) -> Result<LockStamp, InitError> {
    stamp_lock_file_at(config, Utc::now())
}

/// Stamp the lock file as of `now`.
pub fn stamp_lock_file_at(
    config: &DataConfig,
    now: DateTime<Utc>,
) -> Result<LockStamp, InitError> {
    let choice = resolve_time_zone(&config.time_zone);

    fs::create_dir_all(&config.data_dir).map_err(|source| {
        InitError::CreateDir {
            path: config.data_dir.clone(),
            source,
        }
    })?;

    let path = config.lock_file_path();
    let contents = format!("{}\n", render_timestamp(now, choice.tz));
    fs::write(&path, &contents).map_err(|source| InitError::Write {
        path: path.clone(),
        source,
    })?;
    info!("stamped {}", path.display());

    Ok(LockStamp {
        path,
        time_zone: choice.tz,
        fell_back: choice.fell_back,
        contents,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn data_config(dir: &std::path::Path, tz: &str) -> DataConfig {
        DataConfig {
            data_dir: dir.to_path_buf(),
            temp_download_dir: dir.join("tmp"),
            geoserver_version: "2.27.x".into(),
            force_reinit: false,
            time_zone: tz.into(),
            artifacts_base_url: "http://unused".into(),
        }
    }

    #[test]
    fn every_known_zone_resolves_without_fallback() {
        for tz in chrono_tz::TZ_VARIANTS.iter().copied() {
            let choice = resolve_time_zone(tz.name());
            assert!(!choice.fell_back, "{} fell back", tz.name());
            assert_eq!(choice.tz, tz);
        }
    }

    #[test]
    fn unknown_zones_fall_back_to_utc() {
        for name in ["", "Mars/Olympus_Mons", "Europe/Madird", "UTC+2"] {
            let choice = resolve_time_zone(name);
            assert!(choice.fell_back, "'{name}' should fall back");
            assert_eq!(choice.tz, chrono_tz::UTC);
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let choice = resolve_time_zone(" Europe/Madrid\n");
        assert!(!choice.fell_back);
        assert_eq!(choice.tz, chrono_tz::Europe::Madrid);
    }

    #[test]
    fn timestamp_reflects_madrid_offsets() {
        let winter = Utc.with_ymd_and_hms(2025, 1, 14, 12, 5, 9).unwrap();
        let summer = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
        let madrid: Tz = "Europe/Madrid".parse().unwrap();

        assert_eq!(
            render_timestamp(winter, madrid),
            "Tue Jan 14 13:05:09 CET 2025"
        );
        assert_eq!(
            render_timestamp(summer, madrid),
            "Tue Jul  1 12:00:00 CEST 2025"
        );
    }

    #[test]
    fn stamp_overwrites_existing_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = data_config(dir.path(), "Europe/Madrid");
        fs::write(cfg.lock_file_path(), "old contents").unwrap();

        let now = Utc.with_ymd_and_hms(2025, 1, 14, 12, 5, 9).unwrap();
        let stamp = stamp_lock_file_at(&cfg, now).expect("stamp");

        assert!(!stamp.fell_back);
        assert_eq!(stamp.path, dir.path().join("geoserver_init.lock"));
        assert_eq!(
            fs::read_to_string(&stamp.path).unwrap(),
            "Tue Jan 14 13:05:09 CET 2025\n"
        );
    }

    #[test]
    fn invalid_zone_still_stamps_in_utc() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = data_config(dir.path(), "Nowhere/Special");

        let now = Utc.with_ymd_and_hms(2025, 1, 14, 12, 5, 9).unwrap();
        let stamp = stamp_lock_file_at(&cfg, now).expect("stamp");

        assert!(stamp.fell_back);
        assert_eq!(stamp.time_zone, chrono_tz::UTC);
        assert_eq!(stamp.contents, "Tue Jan 14 12:05:09 UTC 2025\n");
    }

    #[test]
    fn missing_data_dir_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = data_config(&dir.path().join("not/yet/there"), "UTC");

        let stamp = stamp_lock_file(&cfg).expect("stamp");

        assert!(stamp.path.is_file());
    }

    #[test]
    fn unwritable_target_reports_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let cfg = data_config(&blocker, "UTC");

        let err = stamp_lock_file(&cfg).unwrap_err();
        assert!(matches!(err, InitError::CreateDir { .. }));
    }
}
