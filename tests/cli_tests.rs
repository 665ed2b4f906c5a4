use std::io::Write;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

use dep_vendor::STAMP_FILE_NAME;

fn fixture_archive() -> (Vec<u8>, String) {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("demo-1.0/a.txt", options).unwrap();
    writer.write_all(b"alpha").unwrap();
    writer.finish().unwrap();
    let bytes = cursor.into_inner();
    let sha256 = dep_vendor::digest::hex_digest(&mut std::io::Cursor::new(&bytes)).unwrap();
    (bytes, sha256)
}

#[test]
fn test_help_command_succeeds() {
    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Fetch, verify and unpack a third-party source archive",
        ));
}

#[test]
fn test_missing_arguments_fail_with_usage_error() {
    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.assert().failure().code(2);
}

#[test]
fn test_patch_requires_patch_executable() {
    let temp_dir = tempdir().unwrap();
    let sha256 = "0".repeat(64);
    let dest_dir = temp_dir.path().join("dest");
    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.args([
        "demo",
        "1.0",
        "http://127.0.0.1:1/demo_1.0.zip",
        sha256.as_str(),
        dest_dir.to_str().unwrap(),
        "--patch",
        "fix.patch",
    ]);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--patch-executable"));
}

#[test]
fn test_unreadable_patch_file_is_an_argument_error() {
    let temp_dir = tempdir().unwrap();
    let sha256 = "0".repeat(64);
    let dest_dir = temp_dir.path().join("dest");
    let missing_patch = temp_dir.path().join("no-such.patch");
    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.args([
        "demo",
        "1.0",
        "http://127.0.0.1:1/demo_1.0.zip",
        sha256.as_str(),
        dest_dir.to_str().unwrap(),
        "--patch-executable",
        "/usr/bin/patch",
        "--patch",
        missing_patch.to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unable to read patch file"));
}

#[test]
fn test_fetch_from_seeded_cache_succeeds() {
    let temp_dir = tempdir().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    let dest_dir = temp_dir.path().join("dest");
    let (bytes, sha256) = fixture_archive();
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("demo_1.0.zip"), &bytes).unwrap();

    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.args([
        "demo",
        "1.0",
        "http://127.0.0.1:1/demo_1.0.zip",
        sha256.as_str(),
        dest_dir.to_str().unwrap(),
        "--cache-dir",
        cache_dir.to_str().unwrap(),
    ]);
    cmd.assert().success();

    assert_eq!(
        std::fs::read_to_string(dest_dir.join("a.txt")).unwrap(),
        "alpha"
    );
    assert!(dest_dir.join(STAMP_FILE_NAME).is_file());
}

#[test]
fn test_digest_mismatch_exits_with_fetch_failure() {
    let temp_dir = tempdir().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    let dest_dir = temp_dir.path().join("dest");
    let (bytes, _) = fixture_archive();
    let wrong_sha256 = "0".repeat(64);
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("demo_1.0.zip"), &bytes).unwrap();

    let mut cmd = Command::cargo_bin("dep-vendor").unwrap();
    cmd.args([
        "demo",
        "1.0",
        "http://127.0.0.1:1/demo_1.0.zip",
        wrong_sha256.as_str(),
        dest_dir.to_str().unwrap(),
        "--cache-dir",
        cache_dir.to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("SHA256 hash"));
}
