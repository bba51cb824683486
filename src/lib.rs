//! # youtube_downloader_host
//!
//! A **browser native messaging host** that downloads videos and audio with
//! [`yt-dlp`](https://github.com/yt-dlp/yt-dlp) when the companion extension asks it to.
//!
//! The extension adds three context-menu entries to video links. Picking one sends
//! a request to this host; the host runs the download, shows a desktop notification,
//! and replies with a status object.
//!
//! ---
//!
//! ## Wire protocol
//!
//! 1. The sender writes a **4-byte length prefix** (`u32`) in **native endianness**.
//! 2. Then writes **that many bytes** of UTF-8 JSON.
//!
//! Requests:
//!
//! ```json
//! {"url": "https://youtu.be/...", "action": "high_quality" | "low_quality" | "audio"}
//! ```
//!
//! Replies:
//!
//! ```json
//! {"status": "success", "action": "audio", "url": "https://youtu.be/..."}
//! {"status": "error", "message": "Unknown action"}
//! ```
//!
//! ### Limits and failure handling
//!
//! - Browser → host: **64 MiB** ([`host::MAX_FROM_BROWSER`]). Host → browser: **1 MiB**
//!   ([`host::MAX_TO_BROWSER`]). A reply over the limit is never partially written.
//! - **Disconnect is normal:** EOF on stdin between frames ends the loop cleanly.
//! - A corrupt, truncated or oversized frame stops the host: framing can no longer be trusted.
//! - Bad requests and failed downloads are answered with `status: "error"`; the host keeps running.
//! - Requests are handled one at a time. A download blocks the loop until it finishes.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`host`] — framing codec and the read → handle → reply loop.
//! - [`dispatch`] — validates a request and runs the download.
//! - [`profile`] — action → format selection and output directory.
//! - [`downloader`] — the download engine trait and the `yt-dlp` backend.
//! - [`notify`] — best-effort desktop notifications.
//! - [`config`] — optional TOML configuration.
//! - [`logging`] — file-backed `tracing` subscriber (stdout is reserved for frames).
//! - [`install`] — browser manifest install/verify/remove.
//!
//! ---
//!
//! ## Handling a request without stdio
//!
//! ```rust
//! use youtube_downloader_host::config::{DownloadSettings, NotificationSettings};
//! use youtube_downloader_host::dispatch::{Dispatcher, Response};
//! use youtube_downloader_host::downloader::YtDlp;
//! use youtube_downloader_host::notify::NoopNotifier;
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(
//!     YtDlp::locate(None),
//!     NoopNotifier,
//!     DownloadSettings::default(),
//!     NotificationSettings::default(),
//! );
//! let reply = dispatcher.process(&json!({"action": "audio"}));
//! assert_eq!(reply, Response::error("No URL provided"));
//! ```
//!
//! ## Pure framing
//!
//! ```rust
//! use youtube_downloader_host::host::{encode_message, read_message};
//! use serde_json::json;
//! use std::io::Cursor;
//!
//! let msg = json!({"url": "https://youtu.be/x", "action": "audio"});
//! let frame = encode_message(&msg).unwrap();
//! let back = read_message(&mut Cursor::new(frame)).unwrap();
//! assert_eq!(back, msg);
//! ```
//!
//! ---
//!
//! ## Installing the manifest
//!
//! The browser only launches hosts it finds a manifest for. The manifest name must
//! match what the extension connects to ([`install::HOST_NAME`]).
//!
//! ```no_run
//! use std::path::Path;
//! use youtube_downloader_host::install::{install_host, verify_installed, Scope, HOST_NAME};
//!
//! install_host(
//!     Path::new("/usr/local/bin/youtube_downloader"),
//!     &["chrome-extension://your_extension_id/".to_string()],
//!     &["youtube-downloader@example.org".to_string()],
//!     &["chrome", "firefox"],
//!     Scope::User,
//! )
//! .unwrap();
//! assert!(verify_installed(HOST_NAME, None, Scope::User).unwrap());
//! ```

pub mod config;
pub mod dispatch;
pub mod downloader;
pub mod host;
#[cfg(feature = "install")]
pub mod install;
pub mod logging;
pub mod notify;
pub mod profile;

// -------- Re-exports --------

#[doc(inline)]
pub use config::HostConfig;
#[doc(inline)]
pub use dispatch::{Dispatcher, Response};
#[doc(inline)]
pub use host::{decode_message, encode_message, read_message, serve, write_message, NmError};

#[cfg(feature = "install")]
#[doc(inline)]
pub use install::{install, remove, verify_installed, Scope};
