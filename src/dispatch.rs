//! Turns one decoded request into one response.
//!
//! Validation and download failures become `{"status":"error"}` replies; nothing
//! raised here ever stops the transport loop.

use crate::config::{DownloadSettings, NotificationSettings};
use crate::downloader::{DownloadOptions, Downloader};
use crate::notify::Notifier;
use crate::profile::{self, DownloadProfile, OutputCategory};
use serde::Serialize;
use serde_json::Value;

pub const NO_URL: &str = "No URL provided";
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Reply sent back to the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success { action: String, url: String },
    Error { message: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}

/// Borrowed view of the fields we care about; everything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub url: Option<&'a str>,
    pub action: Option<&'a str>,
}

impl<'a> Request<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        let field = move |name: &str| value.get(name).and_then(Value::as_str);
        Request {
            url: field("url").filter(|u| !u.is_empty()),
            action: field("action"),
        }
    }
}

pub struct Dispatcher<D, N> {
    downloader: D,
    notifier: N,
    downloads: DownloadSettings,
    notifications: NotificationSettings,
}

impl<D: Downloader, N: Notifier> Dispatcher<D, N> {
    pub fn new(
        downloader: D,
        notifier: N,
        downloads: DownloadSettings,
        notifications: NotificationSettings,
    ) -> Self {
        Self {
            downloader,
            notifier,
            downloads,
            notifications,
        }
    }

    /// Profile parameters merged with the fixed common options.
    pub fn options_for(&self, profile: &DownloadProfile) -> DownloadOptions {
        let output_dir = match profile.category {
            OutputCategory::Video => self.downloads.video_dir.clone(),
            OutputCategory::Audio => self.downloads.audio_dir.clone(),
        };
        DownloadOptions {
            format: profile.format.map(str::to_string),
            format_sort: profile.format_sort.iter().map(|s| s.to_string()).collect(),
            output_dir,
            output_template: self.downloads.output_template.clone(),
            proxy: self.downloads.effective_proxy().map(str::to_string),
            quiet: true,
        }
    }

    pub fn process(&self, request: &Value) -> Response {
        let req = Request::from_value(request);
        tracing::info!(url = ?req.url, action = ?req.action, "processing message");

        let Some(url) = req.url else {
            return Response::error(NO_URL);
        };
        let Some(profile) = req.action.and_then(profile::resolve) else {
            return Response::error(UNKNOWN_ACTION);
        };

        let opts = self.options_for(&profile);
        match self.downloader.download(url, &opts) {
            Ok(outcome) => {
                tracing::info!(path = %outcome.path.display(), "download completed");
                if self.notifications.enabled {
                    let body = format!("Download completed: {}", outcome.file_name());
                    if let Err(e) = self.notifier.notify(&self.notifications.title, &body) {
                        tracing::debug!(error = %e, "notification failed");
                    }
                }
                Response::Success {
                    action: profile.action.as_str().to_string(),
                    url: url.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, url, "error during processing message");
                Response::error(e.to_string())
            }
        }
    }
}
