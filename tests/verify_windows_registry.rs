#![cfg(all(windows, feature = "install", feature = "windows-registry"))]

mod common;

use serial_test::serial;
use std::path::PathBuf;
use youtube_downloader_host::install::{
    install_host, paths, remove, verify_installed, winreg, Scope, HOST_NAME,
};

fn exe_path() -> PathBuf {
    PathBuf::from(r"C:\Windows\System32\cmd.exe")
}

#[test]
#[serial]
fn verify_is_registry_aware_on_windows() {
    let (_td, _env) = common::sandbox_env();

    let browsers: &[&str] = &["chrome", "firefox", "edge"];

    install_host(
        &exe_path(),
        &["chrome-extension://test/".to_string()],
        &["test@example.org".to_string()],
        browsers,
        Scope::User,
    )
    .unwrap();

    assert!(verify_installed(HOST_NAME, Some(browsers), Scope::User).unwrap());

    // The registry pointer resolves to the manifest file that was written.
    let key_path = paths::winreg_key_path("chrome", Scope::User, HOST_NAME).unwrap();
    let p = winreg::read_manifest_path_from_reg(Scope::User, &key_path)
        .unwrap()
        .expect("registry key should exist");
    assert!(p.exists(), "registry should point to existing manifest: {p:?}");

    remove(HOST_NAME, browsers, Scope::User).unwrap();
    assert!(!verify_installed(HOST_NAME, Some(browsers), Scope::User).unwrap());
    assert!(winreg::read_manifest_path_from_reg(Scope::User, &key_path)
        .unwrap()
        .is_none());
}
