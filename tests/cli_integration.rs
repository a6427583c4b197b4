//! Integration tests for the apt-plugin CLI
//!
//! Every test runs the real binary against the mock backend in its own
//! sandbox, so the exit-code contract is checked end to end.

mod common;

use common::{Sandbox, repository};
use predicates::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// LOCAL FILE INSTALLS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_install_nonexistent_file_is_internal_error() {
    // ===== ARRANGE =====
    let sandbox = Sandbox::with_state(&repository());
    let missing = sandbox.work_dir().join("notafile.deb");
    assert!(!sandbox.is_installed("rolldice"));

    // ===== ACT =====
    let assert = sandbox
        .plugin()
        .args(["install", "rolldice", "--file"])
        .arg(&missing)
        .assert();

    // ===== ASSERT =====
    assert
        .code(5)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ERROR"));
    assert!(!sandbox.is_installed("rolldice"));
    assert_eq!(sandbox.state().mutations, 0);
}

#[test]
fn test_install_relative_nonexistent_file_is_internal_error() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .args(["install", "rolldice", "--file", "notafile.deb"])
        .assert()
        .code(5);

    assert!(!sandbox.is_installed("rolldice"));
}

#[test]
fn test_install_valid_file() {
    // ===== ARRANGE =====
    let sandbox = Sandbox::new();
    let deb = sandbox.deb("rolldice", "1.16-1+b3");

    // ===== ACT =====
    let assert = sandbox
        .plugin()
        .args(["install", "rolldice", "--file"])
        .arg(&deb)
        .assert();

    // ===== ASSERT =====
    assert.success();
    assert_eq!(
        sandbox.state().installed.get("rolldice").map(String::as_str),
        Some("1.16-1+b3")
    );
}

#[test]
fn test_install_file_with_wrong_package_name_is_invalid() {
    let sandbox = Sandbox::new();
    let deb = sandbox.deb("rolldice", "1.16-1+b3");

    sandbox
        .plugin()
        .args(["install", "vim", "--file"])
        .arg(&deb)
        .assert()
        .code(2);

    assert!(sandbox.state().installed.is_empty());
}

#[test]
fn test_install_file_that_is_not_a_deb() {
    let sandbox = Sandbox::new();
    let bogus = sandbox.work_dir().join("bogus.deb");
    std::fs::write(&bogus, "definitely not an ar archive").unwrap();

    sandbox
        .plugin()
        .args(["install", "bogus", "--file"])
        .arg(&bogus)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("artifact"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPOSITORY INSTALLS AND REMOVALS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_install_is_idempotent() {
    // ===== ARRANGE =====
    let sandbox = Sandbox::with_state(&repository());

    // ===== ACT =====
    sandbox.plugin().args(["install", "rolldice"]).assert().success();
    let after_first = sandbox.state().mutations;
    sandbox
        .plugin()
        .args(["install", "rolldice", "--version", "1.16-1+b3"])
        .assert()
        .success();

    // ===== ASSERT =====
    assert_eq!(after_first, 1);
    assert_eq!(sandbox.state().mutations, 1, "second install must not mutate");
}

#[test]
fn test_module_version_alias() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .args(["install", "nano", "--module-version", "7.2-1"])
        .assert()
        .success();

    assert!(sandbox.is_installed("nano"));
}

#[test]
fn test_short_v_selects_version() {
    // ===== ARRANGE =====
    let sandbox = Sandbox::with_state(&repository());

    // ===== ACT =====
    sandbox
        .plugin()
        .args(["install", "nano", "-v", "7.2-1"])
        .assert()
        .success();
    sandbox
        .plugin()
        .args(["remove", "nano", "-v", "7.2-1"])
        .assert()
        .success();

    // ===== ASSERT =====
    assert!(!sandbox.is_installed("nano"));
    assert_eq!(sandbox.state().mutations, 2);
}

#[test]
fn test_remove_absent_package_is_not_found() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .args(["remove", "rolldice"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not installed"));

    assert_eq!(sandbox.state(), repository());
}

#[test]
fn test_install_then_remove_restores_state() {
    let sandbox = Sandbox::with_state(&repository());
    let before = sandbox.state().installed;

    sandbox.plugin().args(["install", "vim"]).assert().success();
    assert!(sandbox.is_installed("vim"));
    sandbox.plugin().args(["remove", "vim"]).assert().success();

    assert_eq!(sandbox.state().installed, before);
}

#[test]
fn test_unknown_repository_package_is_not_found() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .args(["install", "no-such-package"])
        .assert()
        .code(1);
}

#[test]
fn test_unknown_version_is_not_found() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .args(["install", "rolldice", "--version", "9.9-9"])
        .assert()
        .code(1);
    assert!(!sandbox.is_installed("rolldice"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// BACKEND FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_lock_busy_is_backend_failure() {
    let mut state = repository();
    state.lock_busy = true;
    let sandbox = Sandbox::with_state(&state);

    sandbox
        .plugin()
        .args(["install", "vim"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("locked"));
}

#[test]
fn test_phantom_success_is_caught_by_post_check() {
    let mut state = repository();
    state.phantom_success = true;
    let sandbox = Sandbox::with_state(&state);

    sandbox.plugin().args(["install", "vim"]).assert().code(4);
    assert!(!sandbox.is_installed("vim"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIST, PREPARE, FINALIZE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_list_prints_json_lines() {
    let mut state = repository();
    state
        .installed
        .insert("rolldice".to_string(), "1.16-1+b3".to_string());
    state.installed.insert("libfoo".to_string(), "1.0".to_string());
    state.auto_installed.insert("libfoo".to_string());
    let sandbox = Sandbox::with_state(&state);

    sandbox
        .plugin()
        .arg("list")
        .assert()
        .success()
        .stdout("{\"name\":\"rolldice\",\"version\":\"1.16-1+b3\"}\n");
}

#[test]
fn test_list_on_empty_database() {
    let sandbox = Sandbox::new();

    sandbox
        .plugin()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_prepare_and_finalize() {
    let mut state = repository();
    state.installed.insert("libfoo".to_string(), "1.0".to_string());
    state.auto_installed.insert("libfoo".to_string());
    let sandbox = Sandbox::with_state(&state);

    sandbox.plugin().arg("prepare").assert().success();
    sandbox.plugin().arg("finalize").assert().success();

    assert!(!sandbox.is_installed("libfoo"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// UPDATE-LIST
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_update_list_applies_batch() {
    let mut state = repository();
    state.installed.insert("nano".to_string(), "7.2-1".to_string());
    let sandbox = Sandbox::with_state(&state);
    let deb = sandbox.deb("localtool", "0.3.1");

    sandbox
        .plugin()
        .arg("update-list")
        .write_stdin(format!(
            "install\trolldice\t\ninstall\tlocaltool\t\t{}\nremove\tnano\n",
            deb.display()
        ))
        .assert()
        .success();

    let state = sandbox.state();
    assert!(state.installed.contains_key("rolldice"));
    assert!(state.installed.contains_key("localtool"));
    assert!(!state.installed.contains_key("nano"));
    assert_eq!(state.mutations, 1);
}

#[test]
fn test_update_list_malformed_line_changes_nothing() {
    let sandbox = Sandbox::with_state(&repository());

    sandbox
        .plugin()
        .arg("update-list")
        .write_stdin("install\trolldice\nupgrade\tvim\n")
        .assert()
        .code(2);

    assert_eq!(sandbox.state(), repository());
}

#[test]
fn test_update_list_naming_a_package_twice_changes_nothing() {
    let mut state = repository();
    state.installed.insert("vim".to_string(), "2:9.1.0016-1".to_string());
    let sandbox = Sandbox::with_state(&state);

    sandbox
        .plugin()
        .arg("update-list")
        .write_stdin("remove\tvim\ninstall\tvim\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("more than once"));

    assert_eq!(sandbox.state(), state);
}

#[test]
fn test_update_list_disabled_is_unsupported() {
    let sandbox = Sandbox::with_state(&repository());
    sandbox.write_config("batch_updates = false\n");

    sandbox
        .plugin()
        .arg("update-list")
        .write_stdin("install\trolldice\n")
        .assert()
        .code(3);

    assert!(!sandbox.is_installed("rolldice"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENTS AND CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_help_and_version() {
    let sandbox = Sandbox::new();

    sandbox
        .plugin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install").and(predicate::str::contains("update-list")));
    sandbox
        .plugin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("apt-plugin"));
}

#[test]
fn test_unknown_verb_is_invalid_input() {
    Sandbox::new()
        .plugin()
        .arg("upgrade")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown verb"));
}

#[test]
fn test_invalid_arguments_are_invalid_input() {
    let sandbox = Sandbox::with_state(&repository());

    for args in [
        vec![],
        vec!["install"],
        vec!["remove", ""],
        vec!["install", "rolldice", "--file", ""],
        vec!["install", "rolldice", "--bogus"],
        vec!["install", "Not_A_Package"],
        vec!["install", "rolldice", "--version", "not a version"],
        vec!["install", "rolldice", "--file"],
    ] {
        sandbox.plugin().args(&args).assert().code(2);
    }

    assert_eq!(sandbox.state().mutations, 0);
}

#[test]
fn test_unparsable_config_is_internal_error() {
    let sandbox = Sandbox::with_state(&repository());
    sandbox.write_config("batch_updates = \"maybe\"\n");

    sandbox
        .plugin()
        .arg("list")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_logs_go_to_stderr() {
    let mut state = repository();
    state.installed.insert("vim".to_string(), "2:9.1.0016-1".to_string());
    let sandbox = Sandbox::with_state(&state);

    sandbox
        .plugin()
        .args(["--verbose", "--verbose", "list"])
        .assert()
        .success()
        .stdout("{\"name\":\"vim\",\"version\":\"2:9.1.0016-1\"}\n");
}
