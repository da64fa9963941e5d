#![deny(missing_docs)]
//! Shared logging utilities for the dl workspace.
//!
//! This crate provides the `dl_*` logging macros used across the codebase,
//! a per-run log file initializer and a minimal test initializer for the
//! global logger.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Directory name, relative to the home directory, used for log files.
pub const LOG_DIR_NAME: &str = ".dl";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! dl_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! dl_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! dl_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! dl_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! dl_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Default log directory: `~/.dl`, or `./.dl` when no home directory is known.
pub fn default_log_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(LOG_DIR_NAME)
}

/// Builds the per-run log file name: `{prefix}-{timestamp}`, or just the
/// timestamp when `prefix` is empty.
pub fn log_file_name(prefix: &str) -> String {
    let stamp = Local::now().format("%b-%-d-%Y-%H-%M-%S-%3f").to_string();
    if prefix.is_empty() {
        stamp
    } else {
        format!("{prefix}-{stamp}")
    }
}

/// Creates `log_dir` and a fresh log file inside it.
pub fn create_log_file(log_dir: &Path, prefix: &str) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file_name(prefix));
    let file = File::create(&path)?;
    Ok((path, file))
}

/// Installs a file logger writing to a new file under `log_dir`.
///
/// Falls back to terminal logging when the file cannot be created. Returns the
/// path of the log file when one was created. Safe to call more than once; only
/// the first installed logger wins.
pub fn initialize_file(log_dir: &Path, prefix: &str, level: LevelFilter) -> Option<PathBuf> {
    let config = build_config();
    let (path, loggers): (Option<PathBuf>, Vec<Box<dyn SharedLogger>>) =
        match create_log_file(log_dir, prefix) {
            Ok((path, file)) => (Some(path), vec![WriteLogger::new(level, config, file)]),
            Err(err) => {
                eprintln!(
                    "Warning: Could not create log file in {:?}: {}",
                    log_dir, err
                );
                (
                    None,
                    vec![TermLogger::new(
                        level,
                        config,
                        TerminalMode::Stderr,
                        ColorChoice::Auto,
                    )],
                )
            }
        };

    let _ = CombinedLogger::init(loggers);
    path
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_carries_prefix() {
        let name = log_file_name("batch");
        assert!(name.starts_with("batch-"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn log_file_name_without_prefix_is_bare_timestamp() {
        let name = log_file_name("");
        assert!(!name.starts_with('-'));
    }

    #[test]
    fn create_log_file_makes_missing_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");
        let (path, _file) = create_log_file(&dir, "run").unwrap();
        assert!(dir.is_dir());
        assert!(path.is_file());
        assert!(path.starts_with(&dir));
    }
}
