//! Browser manifest installation, so the browser can find and launch the host.

pub mod manifest;
pub mod paths;

#[cfg(all(windows, feature = "windows-registry"))]
pub mod winreg;

pub use manifest::*;
pub use paths::*;
