//! File logging for the language server binary
//!
//! stdout carries the protocol stream, so log output goes to a file in the
//! platform's local data directory instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable that overrides the log level, e.g. `debug`
pub const LOG_LEVEL_ENV: &str = "DESIGN_TOKENS_LOG";

struct FileLogger {
    file: Mutex<fs::File>,
    level: LevelFilter,
}

impl FileLogger {
    fn new(file_path: PathBuf, level: LevelFilter) -> io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(file_path)?;

        Ok(FileLogger {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "[{}] [{}] [{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
            let _ = file.flush();
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Get the platform-specific log file path
fn get_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_local_dir().ok_or("Could not determine local data directory")?;
    Ok(data_dir
        .join("DesignTokens")
        .join("design_tokens_language_server.log"))
}

/// Level from [`LOG_LEVEL_ENV`], `Info` when unset or invalid
fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Initialize the logger, overwriting the previous session's log
pub fn init_logger() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_file_path = get_log_file_path()?;
    let level = level_from_env();
    let logger = FileLogger::new(log_file_path.clone(), level)?;

    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;

    Ok(log_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_logger_filters_by_level() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("server.log");
        let logger = FileLogger::new(path.clone(), LevelFilter::Warn).unwrap();

        logger.log(
            &Record::builder()
                .level(log::Level::Warn)
                .target("tokens")
                .args(format_args!("kept"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(log::Level::Debug)
                .args(format_args!("dropped"))
                .build(),
        );
        logger.flush();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("[WARN] [tokens] kept"));
        assert!(!content.contains("dropped"));
    }
}
