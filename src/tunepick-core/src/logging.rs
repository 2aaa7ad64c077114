use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "tunepick.log";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber: a daily rolling file, plus stderr when
/// `console` is enabled. Nothing is ever written to stdout.
pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir().to_path_buf();
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let env_filter = EnvFilter::try_new(config.level.as_filter_directive()).map_err(|source| {
        LoggingError::ParseLevel {
            level: config.level.as_filter_directive().to_string(),
            source,
        }
    })?;

    let (file_writer, file_guard, pruned) = build_file_writer(config, &log_dir)?;
    let writer = if config.console {
        BoxMakeWriter::new(
            std::io::stderr
                .with_max_level(tracing::Level::TRACE)
                .and(file_writer),
        )
    } else {
        BoxMakeWriter::new(file_writer)
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;
    if pruned > 0 {
        tracing::debug!(pruned, log_dir = %log_dir.display(), "removed old log files");
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn build_file_writer(
    config: &LoggingConfig,
    log_dir: &Path,
) -> Result<(NonBlocking, WorkerGuard, usize), LoggingError> {
    let file_name = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    let pruned = prune_rotated_logs(log_dir, file_name, config.max_log_files.max(1))?;

    let appender = tracing_appender::rolling::daily(log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, guard, pruned))
}

/// Date suffix of a daily rotated log, `<file_name>.<YYYY-MM-DD>`.
fn rotation_date<'a>(entry_name: &'a str, file_name: &str) -> Option<&'a str> {
    let date = entry_name.strip_prefix(file_name)?.strip_prefix('.')?;
    let well_formed = date.len() == 10
        && date.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    well_formed.then_some(date)
}

/// Keep the newest `keep` rotated files of `file_name`; other files in the
/// directory are never touched. Returns how many were removed.
fn prune_rotated_logs(dir: &Path, file_name: &str, keep: usize) -> Result<usize, LoggingError> {
    let listing = fs::read_dir(dir).map_err(|source| LoggingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut rotated: Vec<(String, PathBuf)> = listing
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let date = rotation_date(&name, file_name)?.to_string();
            Some((date, entry.path()))
        })
        .collect();

    // ISO dates sort chronologically.
    rotated.sort();
    let excess = rotated.len().saturating_sub(keep);
    for (_, path) in rotated.drain(..excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::Cleanup { path, source })?;
    }
    Ok(excess)
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove old log file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn filter_directive_is_lowercase() {
        assert_eq!(LogLevel::Info.as_filter_directive(), "info");
    }

    #[test]
    fn rotation_date_requires_exact_daily_suffix() {
        assert_eq!(
            rotation_date("tunepick.log.2026-10-19", "tunepick.log"),
            Some("2026-10-19")
        );
        assert_eq!(rotation_date("tunepick.log", "tunepick.log"), None);
        assert_eq!(rotation_date("tunepick.log.bak", "tunepick.log"), None);
        assert_eq!(rotation_date("tunepick.logs.2026-10-19", "tunepick.log"), None);
        assert_eq!(rotation_date("tunepick.log.2026-10-19.gz", "tunepick.log"), None);
        assert_eq!(rotation_date("tunepick.log.2026/10/19", "tunepick.log"), None);
    }

    #[test]
    fn pruning_keeps_newest_days_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        // Written newest first so modification times disagree with the dates.
        for day in ["2026-01-03", "2026-01-01", "2026-01-02"] {
            fs::write(dir.path().join(format!("{DEFAULT_LOG_FILE}.{day}")), day).unwrap();
        }
        for other in ["unrelated.txt", "tunepick.log.bak", "tunepick.log.2025-12-31.gz"] {
            fs::write(dir.path().join(other), "keep").unwrap();
        }

        let removed = prune_rotated_logs(dir.path(), DEFAULT_LOG_FILE, 2).unwrap();

        assert_eq!(removed, 1);
        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "tunepick.log.2025-12-31.gz".to_string(),
                format!("{DEFAULT_LOG_FILE}.2026-01-02"),
                format!("{DEFAULT_LOG_FILE}.2026-01-03"),
                "tunepick.log.bak".to_string(),
                "unrelated.txt".to_string(),
            ]
        );
    }

    #[test]
    fn nothing_to_prune_under_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(format!("{DEFAULT_LOG_FILE}.2026-01-01")), "").unwrap();
        assert_eq!(prune_rotated_logs(dir.path(), DEFAULT_LOG_FILE, 7).unwrap(), 0);
    }
}
