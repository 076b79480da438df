//! Tracing subscriber setup.
//!
//! The terminal UI owns stdout/stderr, so interactive sessions log to
//! `~/.tikitly/logs/tikitly.log`. One-off commands log to stderr.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `~/.tikitly/logs/tikitly.log`
    pub fn default_file() -> Result<Self> {
        let home = crate::config::Config::home_dir()?;
        Ok(LogTarget::File(home.join("logs").join("tikitly.log")))
    }
}

/// Default filter directive for a `-v` count. `RUST_LOG` wins when set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "tikitly_support=warn",
        1 => "tikitly_support=info",
        2 => "tikitly_support=debug",
        _ => "tikitly_support=trace,reqwest=debug",
    }
}

/// Install the global subscriber
pub fn init_logging(target: &LogTarget, verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "tikitly_support=warn");
        assert_eq!(default_directive(2), "tikitly_support=debug");
        assert!(default_directive(9).starts_with("tikitly_support=trace"));
    }

    #[test]
    fn log_file_and_parents_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("tikitly.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
