//! CLI integration tests for the `sms` commands

use assert_cmd::Command;
use emu_sms::{compute_checksum, header_offset};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn emutil() -> Command {
    let mut cmd = Command::cargo_bin("emutil").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// 32K image declaring 32K with a correct checksum
fn valid_rom() -> Vec<u8> {
    let mut data: Vec<u8> = (0..0x8000usize).map(|i| (i % 253) as u8).collect();
    let offset = header_offset(data.len());
    data[offset..offset + 8].copy_from_slice(b"TMR SEGA");
    data[offset + 0x0F] = 0x7C;
    let checksum = compute_checksum(&data, offset, 0x8000);
    data[offset + 0x0A..offset + 0x0C].copy_from_slice(&checksum.to_le_bytes());
    data
}

fn write_rom(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_info_prints_header_and_digests() {
    let temp_dir = TempDir::new().unwrap();
    let rom = write_rom(temp_dir.path(), "demo.gg", &valid_rom());

    emutil()
        .args(["sms", "info"])
        .arg(&rom)
        .assert()
        .success()
        .stdout(predicate::str::contains("Game Gear"))
        .stdout(predicate::str::contains("0x7FF0"))
        .stdout(predicate::str::contains("GG International"))
        .stdout(predicate::str::contains("SHA-1"))
        .stdout(predicate::str::contains("No validation errors"));
}

#[test]
fn test_validate_accepts_good_rom() {
    let temp_dir = TempDir::new().unwrap();
    let rom = write_rom(temp_dir.path(), "demo.gg", &valid_rom());

    emutil()
        .args(["sms", "validate"])
        .arg(&rom)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_reports_checksum_error_for_game_gear() {
    let temp_dir = TempDir::new().unwrap();
    let mut data = valid_rom();
    data[0x100] = data[0x100].wrapping_add(1);
    let sms = write_rom(temp_dir.path(), "demo.sms", &data);
    let gg = write_rom(temp_dir.path(), "demo.gg", &data);

    emutil().args(["sms", "validate"]).arg(&sms).assert().success();

    emutil()
        .args(["sms", "validate"])
        .arg(&gg)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[CKS] ROM checksum error"));

    emutil()
        .args(["sms", "validate", "--game-gear"])
        .arg(&sms)
        .assert()
        .failure();
}

#[test]
fn test_validate_reports_size_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let mut data = valid_rom();
    data.extend(std::iter::repeat_n(0u8, 0x8000));
    let rom = write_rom(temp_dir.path(), "big.sms", &data);

    emutil()
        .args(["sms", "validate"])
        .arg(&rom)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[RSZ]"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_info_rejects_tiny_rom() {
    let temp_dir = TempDir::new().unwrap();
    let rom = write_rom(temp_dir.path(), "tiny.sms", &[0u8; 64]);

    emutil()
        .args(["sms", "info"])
        .arg(&rom)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ROM too small"));
}

#[test]
fn test_info_missing_rom() {
    let temp_dir = TempDir::new().unwrap();

    emutil()
        .args(["sms", "info"])
        .arg(temp_dir.path().join("nothing.sms"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source ROM not found"));
}

#[cfg(feature = "serde")]
#[test]
fn test_info_json() {
    let temp_dir = TempDir::new().unwrap();
    let rom = write_rom(temp_dir.path(), "demo.sms", &valid_rom());

    let output = emutil()
        .args(["sms", "info", "--json"])
        .arg(&rom)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["header"]["header_offset"], 0x7FF0);
    assert_eq!(report["header"]["kind"], "MasterSystem");
    assert!(report["validation_errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_operations_lists_registry() {
    emutil()
        .arg("operations")
        .assert()
        .success()
        .stdout(predicate::str::contains("PATCH_BPS"))
        .stdout(predicate::str::contains("Inspect SMS/Game Gear ROM"));
}

#[test]
fn test_completions() {
    emutil()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("emutil"));
}
