//! The download engine the dispatcher hands work to.
//!
//! [`YtDlp`] drives the external `yt-dlp` binary. The call blocks until the
//! download finishes; there is no timeout and no retry.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The engine reported a failure; the text is passed to the extension as-is.
    #[error("{0}")]
    Failed(String),

    #[error("failed to run {}: {source}", binary.display())]
    Launch {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything the engine needs for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub format_sort: Vec<String>,
    pub output_dir: PathBuf,
    pub output_template: String,
    pub proxy: Option<String>,
    /// Suppress warnings and progress output.
    pub quiet: bool,
}

/// Result descriptor of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
}

impl DownloadOutcome {
    /// Base name of the produced file, for the completion notification.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// A blocking download engine.
pub trait Downloader {
    fn download(&self, url: &str, opts: &DownloadOptions) -> Result<DownloadOutcome, DownloadError>;
}

impl<T: Downloader + ?Sized> Downloader for &T {
    fn download(&self, url: &str, opts: &DownloadOptions) -> Result<DownloadOutcome, DownloadError> {
        (**self).download(url, opts)
    }
}

/// Downloader backed by the `yt-dlp` command line program.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary_path: PathBuf,
}

impl YtDlp {
    pub const BINARY: &'static str = "yt-dlp";

    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Look up `yt-dlp` in `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which(Self::BINARY).ok().map(Self::new)
    }

    /// Use `configured` if given, else search `PATH`, else fall back to the bare
    /// name so the launch error names the missing program.
    pub fn locate(configured: Option<&Path>) -> Self {
        match configured {
            Some(p) => Self::new(p.to_path_buf()),
            None => Self::from_path().unwrap_or_else(|| Self::new(PathBuf::from(Self::BINARY))),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Command line for one download, excluding the program itself.
    pub fn build_args(url: &str, opts: &DownloadOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(format) = &opts.format {
            args.push("--format".into());
            args.push(format.into());
        }
        if !opts.format_sort.is_empty() {
            args.push("--format-sort".into());
            args.push(opts.format_sort.join(",").into());
        }
        args.push("--paths".into());
        let mut home = OsString::from("home:");
        home.push(opts.output_dir.as_os_str());
        args.push(home);
        args.push("--output".into());
        args.push(opts.output_template.as_str().into());
        if let Some(proxy) = &opts.proxy {
            args.push("--proxy".into());
            args.push(proxy.into());
        }
        if opts.quiet {
            for flag in ["--quiet", "--no-warnings", "--no-progress"] {
                args.push(flag.into());
            }
        }
        // --print implies --simulate; the final path is printed once moved into place
        for arg in ["--no-simulate", "--print", "after_move:filepath", "--"] {
            args.push(arg.into());
        }
        args.push(url.into());
        args
    }
}

impl Downloader for YtDlp {
    fn download(&self, url: &str, opts: &DownloadOptions) -> Result<DownloadOutcome, DownloadError> {
        tracing::debug!(binary = %self.binary_path.display(), url, "running yt-dlp");
        let output = Command::new(&self.binary_path)
            .args(Self::build_args(url, opts))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DownloadError::Launch {
                binary: self.binary_path.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = error_message(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(DownloadError::Failed(message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(outcome_from_stdout(url, &stdout))
    }
}

/// Last `ERROR:` line of yt-dlp's stderr, without the prefix.
fn error_message(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
}

fn printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(PathBuf::from)
}

/// The download already succeeded once yt-dlp exits 0; a missing path only
/// costs the notification its file name, so the URL stands in for it.
fn outcome_from_stdout(url: &str, stdout: &str) -> DownloadOutcome {
    let path = printed_path(stdout).unwrap_or_else(|| {
        tracing::warn!(url, "yt-dlp succeeded but printed no file path");
        PathBuf::from(url)
    });
    DownloadOutcome { path }
}
