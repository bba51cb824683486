use super::paths::Scope;
use std::{io, path::Path, path::PathBuf};
use ::winreg::{
    enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE},
    RegKey,
};

fn root(scope: Scope) -> RegKey {
    match scope {
        Scope::User => RegKey::predef(HKEY_CURRENT_USER),
        Scope::System => RegKey::predef(HKEY_LOCAL_MACHINE),
    }
}

/// Point the browser at `manifest` by setting the key's default value.
pub fn write_manifest_path_to_reg(scope: Scope, key_path: &str, manifest: &Path) -> io::Result<()> {
    let (key, _) = root(scope).create_subkey(key_path)?;
    key.set_value("", &manifest.to_string_lossy().as_ref())?;
    Ok(())
}

/// The manifest path stored under `key_path`, or `None` if the key is absent.
pub fn read_manifest_path_from_reg(scope: Scope, key_path: &str) -> io::Result<Option<PathBuf>> {
    let key = match root(scope).open_subkey(key_path) {
        Ok(k) => k,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let value: String = key.get_value("")?;
    Ok(Some(PathBuf::from(value)))
}

/// Delete the host's key; a key that is already gone is fine.
pub fn remove_reg_key(scope: Scope, key_path: &str) -> io::Result<()> {
    match root(scope).delete_subkey_all(key_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
