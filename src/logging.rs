//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file or not at
//! all. Dump mode may log to stderr. `RUST_LOG` overrides the default level.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
    Disabled,
}

/// `RUST_LOG`, or `default_level` when unset or invalid.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub fn build_subscriber(
    writer: BoxMakeWriter,
    ansi: bool,
    env_filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer().with_writer(writer).with_ansi(ansi);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

/// Install the global subscriber for `target`.
pub fn init(target: &LogTarget, default_level: &str) -> Result<()> {
    let (writer, ansi) = match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
    };
    // A subscriber may already be installed (tests, repeated init).
    if tracing::subscriber::set_global_default(build_subscriber(writer, ansi, env_filter(default_level)))
        .is_err()
    {
        tracing::debug!("global subscriber already set");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn file_subscriber(file: &NamedTempFile, level: &str) -> impl tracing::Subscriber + Send + Sync {
        let writer = BoxMakeWriter::new(Arc::new(file.reopen().unwrap()));
        build_subscriber(writer, false, EnvFilter::new(level))
    }

    #[test]
    fn writes_events_at_default_level() {
        let file = NamedTempFile::new().unwrap();
        tracing::subscriber::with_default(file_subscriber(&file, "info"), || {
            tracing::info!(dir = "/src", "added top-level directory");
        });
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("added top-level directory"));
        assert!(contents.contains("dir=\"/src\"") || contents.contains("dir=/src"));
    }

    #[test]
    fn filters_below_default_level() {
        let file = NamedTempFile::new().unwrap();
        tracing::subscriber::with_default(file_subscriber(&file, "warn"), || {
            tracing::info!("populated item");
            tracing::warn!("reader failed");
        });
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(!contents.contains("populated item"));
        assert!(contents.contains("reader failed"));
    }

    #[test]
    fn disabled_target_is_noop() {
        assert!(init(&LogTarget::Disabled, "info").is_ok());
    }
}
