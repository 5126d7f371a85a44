//! CLI integration tests using the real netter-setup binary

mod common;

use assert_cmd::Command;
use common::{DESCRIPTOR, TestProject};
use predicates::prelude::*;

#[allow(deprecated)]
fn netter_cmd() -> Command {
    let mut cmd = Command::cargo_bin("netter-setup").unwrap();
    cmd.env_remove("NETTER_PROJECT_DIR").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_short_help_shows_about() {
    netter_cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Netter build environment"));
}

#[test]
fn test_help_output() {
    netter_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detects and installs the native toolchain"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("patch"));
}

#[test]
fn test_version_output() {
    netter_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netter-setup"))
        .stdout(predicate::str::contains("Build info"));
}

#[test]
fn test_unknown_command_fails() {
    netter_cmd().arg("frobnicate").assert().failure();
}

#[test]
fn test_patch_inserts_deploy_block() {
    let project = TestProject::with_descriptor();

    netter_cmd()
        .args(["patch", "-p"])
        .arg(&project.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("updated with automatic deployment settings"));

    let text = String::from_utf8(project.read_bytes("CMakeLists.txt")).unwrap();
    assert!(text.starts_with(DESCRIPTOR.trim_end()));
    assert!(text.contains("qt-deploy (managed by netter-setup)"));
    assert!(text.contains("windeployqt"));
}

#[test]
fn test_patch_twice_is_byte_identical() {
    let project = TestProject::with_descriptor();

    netter_cmd().arg("patch").arg("-p").arg(&project.path).assert().success();
    let first = project.read_bytes("CMakeLists.txt");

    netter_cmd()
        .arg("patch")
        .arg("-p")
        .arg(&project.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already updated"));
    assert_eq!(project.read_bytes("CMakeLists.txt"), first);
}

#[test]
fn test_patch_dry_run_leaves_file_alone() {
    let project = TestProject::with_descriptor();

    netter_cmd()
        .args(["patch", "--dry-run", "-p"])
        .arg(&project.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("would be updated"))
        .stdout(predicate::str::contains("qt-deploy"));

    assert_eq!(project.read_bytes("CMakeLists.txt"), DESCRIPTOR.as_bytes());
}

#[test]
fn test_patch_without_anchor_is_not_an_error() {
    let project = TestProject::new();
    let original = "cmake_minimum_required(VERSION 3.16)\nproject(Netter)\n";
    project.write_file("CMakeLists.txt", original);

    netter_cmd()
        .args(["patch", "-p"])
        .arg(&project.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Could not find a suitable place"));

    assert_eq!(project.read_bytes("CMakeLists.txt"), original.as_bytes());
}

#[test]
fn test_patch_missing_descriptor_fails() {
    let project = TestProject::new();

    netter_cmd()
        .args(["patch", "-p"])
        .arg(&project.path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_patch_honors_configured_descriptor() {
    let project = TestProject::new();
    project.write_file("netter-setup.yaml", "descriptor: app/CMakeLists.txt\n");
    project.write_file("app/CMakeLists.txt", DESCRIPTOR);

    netter_cmd()
        .args(["patch", "-p"])
        .arg(&project.path)
        .assert()
        .success();

    let text = String::from_utf8(project.read_bytes("app/CMakeLists.txt")).unwrap();
    assert!(text.contains("qt-deploy"));
}

#[test]
fn test_invalid_config_fails() {
    let project = TestProject::with_descriptor();
    project.write_file("netter-setup.yaml", "qt: [not, a, mapping]\n");

    netter_cmd()
        .args(["patch", "-p"])
        .arg(&project.path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_project_dir_from_env() {
    let project = TestProject::with_descriptor();

    netter_cmd()
        .arg("patch")
        .env("NETTER_PROJECT_DIR", &project.path)
        .assert()
        .success();

    assert!(project.read_bytes("CMakeLists.txt").len() > DESCRIPTOR.len());
}

#[cfg(unix)]
#[test]
fn test_script_writes_executable_launcher() {
    use std::os::unix::fs::PermissionsExt;

    let project = TestProject::new();

    netter_cmd()
        .args(["script", "-p"])
        .arg(&project.path)
        .assert()
        .success()
        .stdout(predicate::str::contains("run_netter.sh"));

    assert!(project.file_exists("run_netter.sh"));
    let mode = std::fs::metadata(project.path.join("run_netter.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);

    let script = String::from_utf8(project.read_bytes("run_netter.sh")).unwrap();
    assert!(script.starts_with("#!/bin/bash"));
    assert!(script.contains("Netter"));
}

#[test]
fn test_completions_bash() {
    netter_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netter-setup"));
}
