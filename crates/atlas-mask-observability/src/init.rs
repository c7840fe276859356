// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always goes to stderr. With the `file-logging` feature and
//! `file_logging = true`, every run also writes JSON logs into its own folder:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── atlas-mask.log
//! ```
//!
//! Old run folders are pruned by age and by count before the new run starts.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of this run's log files, if file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

fn env_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an invalid level, an unwritable log directory, or when a global
/// subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&config.level);
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let console = match config.format {
        LogFormat::Text => console.with_filter(env_filter(&filter)?).boxed(),
        LogFormat::Json => console.json().with_filter(env_filter(&filter)?).boxed(),
    };
    layers.push(console);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = if config.file_logging {
        let now = Utc::now();
        let run_dir = create_run_dir(&config.log_dir, now)?;
        cleanup_old_logs(
            &config.log_dir,
            config.retention_days,
            config.retention_runs,
            now,
        )?;

        let appender = tracing_appender::rolling::never(&run_dir, "atlas-mask.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(env_filter(&filter)?)
            .boxed();
        layers.push(file_layer);
        (vec![guard], Some(run_dir))
    } else {
        (Vec::new(), None)
    };

    #[cfg(not(feature = "file-logging"))]
    let run_dir: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if cfg!(not(feature = "file-logging")) && config.file_logging {
        tracing::warn!("File logging requested but this build lacks the `file-logging` feature");
    }
    if let Some(dir) = &run_dir {
        tracing::info!(log_dir = %dir.display(), "Writing log files");
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_dir,
    })
}

/// Initialize console logging with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

/// Create `run_<timestamp>` under `base_log_dir`, adding a suffix on collision
pub fn create_run_dir(base_log_dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let stamp = format!("{}{}", RUN_PREFIX, now.format(RUN_TIMESTAMP_FORMAT));
    let mut run_dir = base_log_dir.join(&stamp);
    let mut suffix = 1;
    while run_dir.exists() {
        run_dir = base_log_dir.join(format!("{}_{}", stamp, suffix));
        suffix += 1;
    }
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

fn run_timestamp(dir_name: &str) -> Option<DateTime<Utc>> {
    let stamp = dir_name.strip_prefix(RUN_PREFIX)?.get(..15)?;
    let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run folders older than `retention_days`, then all but the newest
/// `retention_runs`; 0 disables either rule
///
/// Returns the removed folders. Folders that do not look like runs are left alone.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    if !base_log_dir.exists() {
        return Ok(Vec::new());
    }

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(timestamp) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(run_timestamp)
        {
            runs.push((path, timestamp));
        }
    }
    runs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    // None when the window reaches past the representable range: nothing expires by age
    let cutoff = i64::try_from(retention_days)
        .ok()
        .and_then(chrono::Duration::try_days)
        .and_then(|window| now.checked_sub_signed(window));
    let mut removed = Vec::new();
    let mut kept = Vec::new();
    for (path, timestamp) in runs {
        let expired = cutoff.is_some_and(|cutoff| timestamp < cutoff);
        if retention_days > 0 && expired {
            remove_run(&path, &mut removed);
        } else {
            kept.push(path);
        }
    }

    if retention_runs > 0 && kept.len() > retention_runs {
        let excess = kept.len() - retention_runs;
        for path in kept.into_iter().take(excess) {
            remove_run(&path, &mut removed);
        }
    }

    Ok(removed)
}

// Runs before the subscriber exists, so failures go to stderr directly
fn remove_run(path: &Path, removed: &mut Vec<PathBuf>) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => removed.push(path.to_path_buf()),
        Err(e) => eprintln!(
            "Warning: Failed to remove old log directory {}: {}",
            path.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn at(stamp: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).unwrap();
        Utc.from_utc_datetime(&naive)
    }

    #[test]
    fn test_run_timestamp_parsing() {
        assert_eq!(run_timestamp("run_20250301_120000"), Some(at("20250301_120000")));
        assert_eq!(run_timestamp("run_20250301_120000_2"), Some(at("20250301_120000")));
        assert_eq!(run_timestamp("notes"), None);
        assert_eq!(run_timestamp("run_garbage"), None);
    }

    #[test]
    fn test_cleanup_by_age_then_count() {
        let dir = TempDir::new().unwrap();
        for name in [
            "run_20250101_000000",
            "run_20250301_000000",
            "run_20250305_000000",
            "run_20250310_000000",
            "keep_me",
        ] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), 30, 2, at("20250311_000000")).unwrap();

        assert_eq!(
            removed,
            vec![
                dir.path().join("run_20250101_000000"),
                dir.path().join("run_20250301_000000"),
            ]
        );
        assert!(dir.path().join("run_20250305_000000").exists());
        assert!(dir.path().join("run_20250310_000000").exists());
        assert!(dir.path().join("keep_me").exists());
    }

    #[test]
    fn test_zero_retention_keeps_everything() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("run_20200101_000000")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 0, 0, at("20250311_000000")).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_huge_retention_window_keeps_old_runs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("run_20200101_000000")).unwrap();

        for days in [u64::MAX, i64::MAX as u64, 1_000_000_000_000] {
            let removed = cleanup_old_logs(dir.path(), days, 0, at("20250311_000000")).unwrap();
            assert!(removed.is_empty());
        }
        assert!(dir.path().join("run_20200101_000000").exists());
    }

    #[test]
    fn test_create_run_dir_avoids_collisions() {
        let dir = TempDir::new().unwrap();
        let now = at("20250311_101500");

        let first = create_run_dir(dir.path(), now).unwrap();
        let second = create_run_dir(dir.path(), now).unwrap();

        assert_eq!(first, dir.path().join("run_20250311_101500"));
        assert_eq!(second, dir.path().join("run_20250311_101500_1"));
    }
}
