//! Maps a requested action to yt-dlp format selection and output category.

use std::fmt;

/// What the extension asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    HighQuality,
    LowQuality,
    Audio,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::HighQuality, Action::LowQuality, Action::Audio];

    /// Parse the wire name. Anything unrecognised is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high_quality" => Some(Action::HighQuality),
            "low_quality" => Some(Action::LowQuality),
            "audio" => Some(Action::Audio),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::HighQuality => "high_quality",
            Action::LowQuality => "low_quality",
            Action::Audio => "audio",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which configured directory a download lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Video,
    Audio,
}

/// Format-selection parameters for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProfile {
    pub action: Action,
    /// yt-dlp `--format` selector, when the default selection is not enough.
    pub format: Option<&'static str>,
    /// yt-dlp `--format-sort` keys, in priority order.
    pub format_sort: &'static [&'static str],
    pub category: OutputCategory,
}

impl DownloadProfile {
    pub fn for_action(action: Action) -> Self {
        match action {
            // at least 720p when available, then the smallest file
            Action::HighQuality => DownloadProfile {
                action,
                format: None,
                format_sort: &["res:720", "+size"],
                category: OutputCategory::Video,
            },
            // at most 360p, then the smallest file
            Action::LowQuality => DownloadProfile {
                action,
                format: None,
                format_sort: &["+res:360", "+size"],
                category: OutputCategory::Video,
            },
            Action::Audio => DownloadProfile {
                action,
                format: Some("ba"),
                format_sort: &["+size"],
                category: OutputCategory::Audio,
            },
        }
    }
}

/// Resolve a wire action name. `None` means "Unknown action".
pub fn resolve(action: &str) -> Option<DownloadProfile> {
    Action::parse(action).map(DownloadProfile::for_action)
}
