use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{collections::BTreeMap, env, io, path::PathBuf};

const BROWSERS_TOML: &str = include_str!("browsers.toml");

/// Install location: the current user's profile or machine-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    System,
}

impl Scope {
    fn as_str(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::System => "system",
        }
    }
}

/// Which manifest allowlist field a browser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// `allowed_origins` with `chrome-extension://<id>/` entries.
    Chromium,
    /// `allowed_extensions` with add-on IDs.
    Firefox,
}

#[derive(Debug, Deserialize)]
struct BrowserEntry {
    family: Family,
    registry: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, String>,
}

static BROWSERS: Lazy<Result<BTreeMap<String, BrowserEntry>, String>> =
    Lazy::new(|| toml::from_str(BROWSERS_TOML).map_err(|e| e.to_string()));

fn browsers() -> io::Result<&'static BTreeMap<String, BrowserEntry>> {
    match &*BROWSERS {
        Ok(table) => Ok(table),
        Err(e) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("embedded browsers.toml is invalid: {e}"),
        )),
    }
}

fn entry(browser: &str) -> io::Result<&'static BrowserEntry> {
    browsers()?.get(browser).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("unknown browser: {browser}"),
        )
    })
}

fn current_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(windows) {
        "windows"
    } else {
        "linux"
    }
}

/// Replace every `{VAR}` with the value of the environment variable `VAR`.
fn expand(template: &str) -> io::Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unterminated placeholder in {template:?}"),
            )
        })?;
        let var = &after[..end];
        let value = env::var(var).map_err(|_| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("environment variable {var} is not set"),
            )
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Every browser key in the embedded table, sorted.
pub fn known_browsers() -> io::Result<Vec<&'static str>> {
    Ok(browsers()?.keys().map(String::as_str).collect())
}

pub fn browser_family(browser: &str) -> io::Result<Family> {
    Ok(entry(browser)?.family)
}

/// Directory the browser searches for manifests on this OS.
///
/// `ErrorKind::Unsupported` when the browser has no location for `scope` here.
pub fn manifest_dir(browser: &str, scope: Scope) -> io::Result<PathBuf> {
    let key = format!("{}_{}", current_os(), scope.as_str());
    let template = entry(browser)?.paths.get(&key).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{browser} has no {} manifest location on {}", scope.as_str(), current_os()),
        )
    })?;
    expand(template).map(PathBuf::from)
}

pub fn manifest_path(browser: &str, scope: Scope, host: &str) -> io::Result<PathBuf> {
    Ok(manifest_dir(browser, scope)?.join(format!("{host}.json")))
}

/// Registry key (relative to HKCU/HKLM) whose default value points at the manifest.
pub fn winreg_key_path(browser: &str, _scope: Scope, host: &str) -> io::Result<String> {
    let base = entry(browser)?.registry.as_deref().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{browser} has no registry location"),
        )
    })?;
    Ok(format!(r"{base}\{host}"))
}
