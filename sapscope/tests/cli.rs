//! CLI smoke tests
//!
//! Each test pins HOME and the XDG directories to a fresh temp dir so the
//! cache, config, and logs never touch the real user environment.

use assert_cmd::Command;
use tempfile::TempDir;

/// Minimal PNG prefix: signature, IHDR length, chunk type, width, height.
/// The built-in oracle only reads this far.
fn png_bytes(width: u32) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    out.extend_from_slice(&13u32.to_be_bytes());
    out.extend_from_slice(b"IHDR");
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&32u32.to_be_bytes());
    out
}

fn sapscope(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sapscope").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env("XDG_STATE_HOME", home.path().join(".local/state"));
    cmd
}

#[test]
fn test_scan_reports_wins_and_caches() {
    let home = TempDir::new().unwrap();
    let shots = TempDir::new().unwrap();

    // Width 8 decodes as a bandage win on turn 10 under the placeholder
    // classifier.
    std::fs::write(shots.path().join("Screenshot_20230815-1.png"), png_bytes(8)).unwrap();
    std::fs::write(shots.path().join("notes.png"), b"not an image").unwrap();

    let output = sapscope(&home)
        .arg("scan")
        .arg(shots.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("oracle self-test returned 11"), "{stdout}");
    assert!(stdout.contains("total wins: 1"), "{stdout}");
    assert!(stdout.contains("wins with bandage: 1"), "{stdout}");
    assert!(stdout.contains("wins on Tuesday: 1"), "{stdout}");
    assert!(stdout.contains("wins on turn 10: 1"), "{stdout}");

    // Second scan serves both files from the cache.
    let output = sapscope(&home)
        .arg("scan")
        .arg(shots.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 classified"), "{stdout}");
    assert!(stdout.contains("1 cache hit(s)"), "{stdout}");
    assert!(stdout.contains("1 known non-screenshot(s)"), "{stdout}");
}

#[test]
fn test_scan_respects_date_gate() {
    let home = TempDir::new().unwrap();
    let shots = TempDir::new().unwrap();
    std::fs::write(shots.path().join("Screenshot_20230101-1.png"), png_bytes(3)).unwrap();

    let output = sapscope(&home)
        .arg("scan")
        .arg(shots.path())
        .arg("--since")
        .arg("20230601")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("total wins: 0"), "{stdout}");
    assert!(stdout.contains("1 below date gate"), "{stdout}");
}

#[test]
fn test_report_on_empty_cache() {
    let home = TempDir::new().unwrap();

    let output = sapscope(&home).arg("report").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("total wins: 0"), "{stdout}");
}

#[test]
fn test_scan_json_output() {
    let home = TempDir::new().unwrap();
    let shots = TempDir::new().unwrap();
    std::fs::write(shots.path().join("Screenshot_20230815-1.png"), png_bytes(7)).unwrap();

    let output = sapscope(&home)
        .arg("scan")
        .arg(shots.path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("json object in output");
    let value: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(value["stats"]["total_wins"], 1);
    assert_eq!(value["summary"]["classified"], 1);
    assert!(value["run_id"].is_string());
}
