use super::paths::{self, Family, Scope};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Name the browser extension passes to `runtime.sendNativeMessage`.
pub const HOST_NAME: &str = "youtube_downloader";
pub const HOST_DESCRIPTION: &str = "Downloads videos and audio with yt-dlp";

/// A native messaging host manifest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl Manifest {
    /// Build the manifest a browser of `family` expects. Only the allowlist
    /// field that family reads is included.
    pub fn for_family(
        family: Family,
        host: &str,
        description: &str,
        exe_path: &Path,
        allowed_origins: &[String],
        allowed_extensions: &[String],
    ) -> Self {
        let (origins, extensions) = match family {
            Family::Chromium => (Some(allowed_origins.to_vec()), None),
            Family::Firefox => (None, Some(allowed_extensions.to_vec())),
        };
        Manifest {
            name: host.to_string(),
            description: description.to_string(),
            path: exe_path.to_path_buf(),
            kind: "stdio".to_string(),
            allowed_origins: origins,
            allowed_extensions: extensions,
        }
    }
}

fn is_unsupported(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Unsupported
}

fn write_manifest(path: &Path, manifest: &Manifest) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

/// Write the host manifest for each browser in `browsers`.
///
/// Browsers without a location for `scope` on this OS are skipped. On
/// Linux/macOS `exe_path` must be absolute, since browsers do not resolve
/// relative paths there.
pub fn install(
    host: &str,
    description: &str,
    exe_path: &Path,
    allowed_origins: &[String],
    allowed_extensions: &[String],
    browsers: &[&str],
    scope: Scope,
) -> io::Result<()> {
    if cfg!(unix) && !exe_path.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("host executable path must be absolute: {}", exe_path.display()),
        ));
    }

    for &browser in browsers {
        let family = paths::browser_family(browser)?;
        let path = match paths::manifest_path(browser, scope, host) {
            Ok(p) => p,
            Err(e) if is_unsupported(&e) => continue,
            Err(e) => return Err(e),
        };
        let manifest = Manifest::for_family(
            family,
            host,
            description,
            exe_path,
            allowed_origins,
            allowed_extensions,
        );
        write_manifest(&path, &manifest)?;

        #[cfg(all(windows, feature = "windows-registry"))]
        {
            let key = paths::winreg_key_path(browser, scope, host)?;
            super::winreg::write_manifest_path_to_reg(scope, &key, &path)?;
        }
    }
    Ok(())
}

/// Install this host's manifest under [`HOST_NAME`].
pub fn install_host(
    exe_path: &Path,
    allowed_origins: &[String],
    allowed_extensions: &[String],
    browsers: &[&str],
    scope: Scope,
) -> io::Result<()> {
    install(
        HOST_NAME,
        HOST_DESCRIPTION,
        exe_path,
        allowed_origins,
        allowed_extensions,
        browsers,
        scope,
    )
}

fn installed_for(browser: &str, host: &str, scope: Scope) -> io::Result<Option<bool>> {
    let path = match paths::manifest_path(browser, scope, host) {
        Ok(p) => p,
        Err(e) if is_unsupported(&e) => return Ok(None),
        Err(e) => return Err(e),
    };
    manifest_present(browser, host, scope, &path).map(Some)
}

#[cfg(not(all(windows, feature = "windows-registry")))]
fn manifest_present(_browser: &str, _host: &str, _scope: Scope, path: &Path) -> io::Result<bool> {
    Ok(path.exists())
}

/// On Windows the browser only sees what the registry points at.
#[cfg(all(windows, feature = "windows-registry"))]
fn manifest_present(browser: &str, host: &str, scope: Scope, _path: &Path) -> io::Result<bool> {
    let key = paths::winreg_key_path(browser, scope, host)?;
    Ok(super::winreg::read_manifest_path_from_reg(scope, &key)?.is_some_and(|p| p.exists()))
}

/// Check whether the manifest is in place.
///
/// With `Some(browsers)` every listed browser that has a location on this OS
/// must have it; with `None` any known browser is enough.
pub fn verify_installed(host: &str, browsers: Option<&[&str]>, scope: Scope) -> io::Result<bool> {
    match browsers {
        Some(list) => {
            let mut checked = false;
            for &browser in list {
                match installed_for(browser, host, scope)? {
                    Some(true) => checked = true,
                    Some(false) => return Ok(false),
                    None => {}
                }
            }
            Ok(checked)
        }
        None => {
            for browser in paths::known_browsers()? {
                if installed_for(browser, host, scope)? == Some(true) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Delete the manifest (and registry pointer) for each browser. Missing
/// manifests are not an error.
pub fn remove(host: &str, browsers: &[&str], scope: Scope) -> io::Result<()> {
    for &browser in browsers {
        let path = match paths::manifest_path(browser, scope, host) {
            Ok(p) => p,
            Err(e) if is_unsupported(&e) => continue,
            Err(e) => return Err(e),
        };
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        #[cfg(all(windows, feature = "windows-registry"))]
        {
            let key = paths::winreg_key_path(browser, scope, host)?;
            super::winreg::remove_reg_key(scope, &key)?;
        }
    }
    Ok(())
}
