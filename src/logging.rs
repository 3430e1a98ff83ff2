use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, appending to `log_file`.
///
/// The terminal belongs to the UI while it runs, so all diagnostics go to a
/// file. `RUST_LOG` overrides the default `info` level. When the file cannot
/// be opened a notice is printed and logging is discarded.
pub fn init(log_file: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_writer(log_file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn log_writer(log_file: &Path) -> BoxMakeWriter {
    match open_log_file(log_file) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            // Printed before the UI takes over the terminal
            eprintln!("Warning: {:#}. Continuing without a log file.", e);
            BoxMakeWriter::new(std::io::sink)
        }
    }
}

fn open_log_file(log_file: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_is_created_and_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uploader.log");
        std::fs::write(&path, b"earlier\n").unwrap();

        let mut file = open_log_file(&path).unwrap();
        std::io::Write::write_all(&mut file, b"later\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_unopenable_log_file_does_not_stop_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("uploader.log");

        assert!(open_log_file(&path).is_err());
        // Only this test installs the global subscriber
        init(&path).unwrap();
        tracing::info!("discarded");
    }
}
