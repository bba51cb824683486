//! Process-wide log sink.
//!
//! stdout belongs to the framing protocol, so logs go to a file (stderr if the
//! file cannot be opened). Initialized once from `main`, before the loop starts.

use crate::config::LogSettings;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log output actually ended up.
#[derive(Debug)]
pub enum LogTarget {
    File,
    /// The file could not be opened; carries the reason.
    Stderr(io::Error),
}

fn open_log_file(settings: &LogSettings) -> io::Result<File> {
    if let Some(dir) = settings.file.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)
}

/// `RUST_LOG` wins over the configured level; an unparsable level falls back to `info`.
pub fn build_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling it a second time is a no-op.
pub fn init(settings: &LogSettings) -> LogTarget {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(settings))
        .with_ansi(false)
        .with_target(false);

    match open_log_file(settings) {
        Ok(file) => {
            let _ = builder.with_writer(Mutex::new(file)).try_init();
            LogTarget::File
        }
        Err(e) => {
            let _ = builder.with_writer(io::stderr).try_init();
            LogTarget::Stderr(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_file_and_parent() {
        let td = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            file: td.path().join("logs").join("host.log"),
            level: "debug".to_string(),
        };
        assert!(open_log_file(&settings).is_ok());
        assert!(settings.file.exists());
    }

    #[test]
    fn unopenable_file_falls_back_to_stderr() {
        let td = tempfile::tempdir().unwrap();
        // a directory cannot be opened for appending
        let settings = LogSettings {
            file: td.path().to_path_buf(),
            level: "debug".to_string(),
        };
        assert!(matches!(init(&settings), LogTarget::Stderr(_)));
    }
}
