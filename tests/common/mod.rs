#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::io;
use std::path::PathBuf;
use tempfile::TempDir;
use youtube_downloader_host::downloader::{
    DownloadError, DownloadOptions, DownloadOutcome, Downloader,
};
use youtube_downloader_host::notify::Notifier;

/// Env guard that restores previous env vars on drop.
pub struct EnvGuard {
    old: HashMap<String, Option<String>>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, String)]) -> Self {
        let mut old = HashMap::new();
        for (k, v) in vars {
            old.insert((*k).to_string(), env::var(k).ok());
            env::set_var(k, v);
        }
        Self { old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, prev) in self.old.drain() {
            match prev {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }
}

/// Create a temp sandbox and point HOME / APPDATA / LOCALAPPDATA / PROGRAMDATA
/// into it so manifest installs never touch the real profile.
pub fn sandbox_env() -> (TempDir, EnvGuard) {
    let td = TempDir::new().expect("tempdir");
    let root = td.path().to_path_buf();

    let home = root.join("home");
    let appdata = root.join("appdata_roaming");
    let localappdata = root.join("appdata_local");
    let programdata = root.join("programdata");

    for dir in [&home, &appdata, &localappdata, &programdata] {
        std::fs::create_dir_all(dir).unwrap();
    }

    let guard = EnvGuard::set(&[
        ("HOME", home.to_string_lossy().to_string()),
        ("APPDATA", appdata.to_string_lossy().to_string()),
        ("LOCALAPPDATA", localappdata.to_string_lossy().to_string()),
        ("PROGRAMDATA", programdata.to_string_lossy().to_string()),
    ]);

    (td, guard)
}

/// One wire frame: native-endian length prefix + payload.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_ne_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

/// Split a byte stream of frames back into JSON values.
pub fn split_frames(mut bytes: &[u8]) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let len = u32::from_ne_bytes(bytes[0..4].try_into().unwrap()) as usize;
        out.push(serde_json::from_slice(&bytes[4..4 + len]).unwrap());
        bytes = &bytes[4 + len..];
    }
    out
}

/// Downloader that records its calls and returns a canned result.
pub struct FakeDownloader {
    pub result: Result<PathBuf, String>,
    pub calls: RefCell<Vec<(String, DownloadOptions)>>,
}

impl FakeDownloader {
    pub fn succeeding(path: &str) -> Self {
        Self {
            result: Ok(PathBuf::from(path)),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, opts: &DownloadOptions) -> Result<DownloadOutcome, DownloadError> {
        self.calls.borrow_mut().push((url.to_string(), opts.clone()));
        match &self.result {
            Ok(path) => Ok(DownloadOutcome { path: path.clone() }),
            Err(msg) => Err(DownloadError::Failed(msg.clone())),
        }
    }
}

/// Notifier that records notifications, optionally failing every call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: RefCell<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> io::Result<()> {
        self.sent
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
        if self.fail {
            Err(io::Error::new(io::ErrorKind::NotFound, "notify-send missing"))
        } else {
            Ok(())
        }
    }
}
