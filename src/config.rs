//! Host configuration.
//!
//! The browser starts the host without arguments, so everything adjustable
//! lives in an optional TOML file:
//!
//! ```toml
//! [downloads]
//! video_dir = "/home/me/Videos"
//! audio_dir = "/home/me/Music"
//! output_template = "%(title)s.%(ext)s"
//! proxy = "socks://127.0.0.1:1080"   # "" disables the proxy
//! yt_dlp = "/usr/local/bin/yt-dlp"   # optional, default: search PATH
//!
//! [notifications]
//! enabled = true
//! title = "YouTube Downloader"
//!
//! [logging]
//! file = "/tmp/native_host.log"
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "YOUTUBE_DOWNLOADER_CONFIG";

const APP_DIR: &str = "youtube_downloader";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub downloads: DownloadSettings,
    pub notifications: NotificationSettings,
    pub logging: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub output_template: String,
    pub proxy: Option<String>,
    pub yt_dlp: Option<PathBuf>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        let home = home_dir();
        Self {
            video_dir: home.join("Videos"),
            audio_dir: home.join("Music"),
            output_template: "%(title)s.%(ext)s".to_string(),
            proxy: Some("socks://127.0.0.1:1080".to_string()),
            yt_dlp: None,
        }
    }
}

impl DownloadSettings {
    /// The proxy to pass on, treating an empty string as "no proxy".
    pub fn effective_proxy(&self) -> Option<&str> {
        self.proxy.as_deref().filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub title: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "YouTube Downloader".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub file: PathBuf,
    /// `tracing` filter directive, e.g. `debug` or `youtube_downloader_host=info`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: env::temp_dir().join("native_host.log"),
            level: "debug".to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load `path`; a missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from [`default_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_path())
    }
}

/// `$YOUTUBE_DOWNLOADER_CONFIG`, else the XDG config dir, else `~/.config`.
pub fn default_path() -> PathBuf {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"));
    base.join(APP_DIR).join(CONFIG_FILE)
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}
