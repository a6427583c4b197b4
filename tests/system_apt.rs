//! Real apt/dpkg tests
//!
//! These mutate the host package database and need root on a Debian-like
//! system with network access.
//!
//! Run: APT_PLUGIN_RUN_SYSTEM_TESTS=1 cargo test --test system_apt

mod common;

use std::path::{Path, PathBuf};

use apt_plugin_lib::package_managers::{deb_archive, dpkg_status};
use assert_cmd::Command;
use common::{TestConfig, serial};

const ROLLDICE_URL: &str =
    "http://ftp.br.debian.org/debian/pool/main/r/rolldice/rolldice_1.16-1+b3_amd64.deb";
const DPKG_STATUS: &str = "/var/lib/dpkg/status";

fn plugin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apt-plugin"));
    cmd.env_remove("APT_PLUGIN_TEST_MODE")
        .env_remove("APT_PLUGIN_CONFIG_DIR");
    cmd
}

fn rolldice_installed() -> bool {
    dpkg_status::installed_version(Path::new(DPKG_STATUS), "rolldice")
        .unwrap()
        .is_some()
}

async fn download_rolldice(dir: &Path) -> PathBuf {
    let bytes = reqwest::get(ROLLDICE_URL)
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let path = dir.join("rolldice_1.16-1+b3_amd64.deb");
    std::fs::write(&path, &bytes).unwrap();
    path
}

#[tokio::test]
#[serial]
async fn test_install_local_file_fail_then_succeed() {
    let config = TestConfig::default();
    if config.skip_if_no_system("test_install_local_file_fail_then_succeed")
        || !config.is_debian_like()
    {
        return;
    }

    // ===== ARRANGE =====
    let dir = tempfile::tempdir().unwrap();
    let deb = download_rolldice(dir.path()).await;
    assert_eq!(deb_archive::inspect(&deb).unwrap().name, "rolldice");
    let fake = dir.path().join("notafile.deb");

    let _ = plugin().args(["remove", "rolldice"]).output().unwrap();
    assert!(!rolldice_installed());

    // ===== ACT / ASSERT: missing file =====
    plugin()
        .args(["install", "rolldice", "--file"])
        .arg(&fake)
        .assert()
        .code(5);
    assert!(!rolldice_installed());

    // ===== ACT / ASSERT: real artifact =====
    plugin()
        .args(["install", "rolldice", "--file"])
        .arg(&deb)
        .assert()
        .success();
    assert!(rolldice_installed());

    plugin()
        .args(["install", "rolldice", "--version", "1.16-1+b3"])
        .assert()
        .success();

    // ===== CLEANUP =====
    plugin().args(["remove", "rolldice"]).assert().success();
    assert!(!rolldice_installed());
}

#[test]
#[serial]
fn test_list_real_database() {
    let config = TestConfig::default();
    if config.skip_if_no_system("test_list_real_database") || !config.is_debian_like() {
        return;
    }

    let output = plugin().arg("list").output().unwrap();
    assert!(output.status.success());
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let module: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(module["name"].is_string());
        assert!(module["version"].is_string());
    }
}
