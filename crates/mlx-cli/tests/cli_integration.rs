//! CLI Integration Tests
//!
//! These tests run the `mlx` binary. Recording tests use the simulated
//! sensor; tests that need a real board are marked with #[ignore].
//!
//! Run mock tests:
//! ```
//! cargo test --package mlx-cli --test cli_integration
//! ```
//!
//! Run hardware tests:
//! ```
//! MLX_DEVICE="MLX R" cargo test --package mlx-cli --test cli_integration -- --ignored --nocapture
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run mlx with config and cache directories pointed at `home`.
fn run_mlx_in(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mlx"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("MLX_DEVICE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run mlx binary")
}

fn run_mlx(args: &[&str]) -> Output {
    let home = tempfile::tempdir().unwrap();
    run_mlx_in(home.path(), args)
}

/// Get device from environment
fn get_device() -> Option<String> {
    env::var("MLX_DEVICE").ok().filter(|s| !s.is_empty())
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_mlx(&["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MLX90632"), "Help should mention the sensor");
    assert!(stdout.contains("scan"), "Help should list scan command");
    assert!(stdout.contains("record"), "Help should list record command");
    assert!(stdout.contains("config"), "Help should list config command");
}

#[test]
fn test_version_command() {
    let output = run_mlx(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mlx"), "Version should contain the binary name");
}

#[test]
fn test_subcommand_help() {
    for cmd in ["scan", "record", "config", "completions"] {
        let output = run_mlx(&[cmd, "--help"]);

        assert!(output.status.success(), "{} --help should succeed", cmd);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.is_empty(), "{} --help should produce output", cmd);
    }
}

#[test]
fn test_invalid_subcommand() {
    let output = run_mlx(&["calibrate"]);
    assert!(!output.status.success());
}

#[test]
fn test_export_conflicts_with_no_export() {
    let output = run_mlx(&["record", "--export", "a.csv", "--no-export"]);
    assert!(!output.status.success());
}

#[test]
fn test_completions_bash() {
    let output = run_mlx(&["completions", "bash"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mlx"));
}

// =============================================================================
// Config Commands
// =============================================================================

#[test]
fn test_config_path() {
    let output = run_mlx(&["config", "path"]);

    assert!(output.status.success(), "Config path should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config.toml"), "Should show config path");
}

#[test]
fn test_config_show_defaults() {
    let output = run_mlx(&["config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("file not found"));
    assert!(stdout.contains("no_color = false"));
}

#[test]
fn test_config_init_then_refuse_overwrite() {
    let home = tempfile::tempdir().unwrap();

    let output = run_mlx_in(home.path(), &["config", "init"]);
    assert!(output.status.success(), "First init should succeed");
    let path = home.path().join("config").join("mlx-monitor").join("config.toml");
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("device_name = \"MLX R\""));

    let output = run_mlx_in(home.path(), &["config", "init"]);
    assert!(!output.status.success(), "Second init should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"));
}

// =============================================================================
// Record with the simulated sensor
// =============================================================================

#[test]
fn test_record_simulated_csv_and_export() {
    let home = tempfile::tempdir().unwrap();
    let export = home.path().join("out.csv");
    let export_arg = export.to_string_lossy().to_string();

    let output = run_mlx_in(
        home.path(),
        &[
            "record",
            "--simulate",
            "--count",
            "2",
            "--format",
            "csv",
            "--export",
            &export_arg,
        ],
    );
    assert!(
        output.status.success(),
        "record failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines[0],
        "Ambient_C,Object_C,SensorElapsed_ms,SensorElapsed_s,MeasureElapsed_s,RecvEpoch_ms,RecvJST"
    );
    assert_eq!(lines.len(), 3);
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), 7);
    }

    let exported = fs::read_to_string(&export).unwrap();
    assert_eq!(exported.lines().count(), 3);
    assert!(exported.ends_with('\n'));
    assert_eq!(exported.lines().next(), Some(lines[0]));
}

#[test]
fn test_record_simulated_json_no_export() {
    let home = tempfile::tempdir().unwrap();

    let output = run_mlx_in(
        home.path(),
        &[
            "record",
            "--simulate",
            "--count",
            "1",
            "--format",
            "json",
            "--no-export",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().unwrap();
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert!(value["ambient_c"].is_number());
    assert!(value["object_c"].is_number());
    assert!(value["measure_elapsed_s"].as_f64().unwrap() >= 0.0);

    assert!(!home.path().join("mlx90632_data.csv").exists());
}

#[test]
fn test_record_simulated_text_default_export_dir() {
    let home = tempfile::tempdir().unwrap();
    let export_dir = home.path().join("exports");
    fs::create_dir_all(home.path().join("config").join("mlx-monitor")).unwrap();
    fs::create_dir_all(&export_dir).unwrap();
    fs::write(
        home.path()
            .join("config")
            .join("mlx-monitor")
            .join("config.toml"),
        format!("export_dir = {:?}\n", export_dir.to_string_lossy()),
    )
    .unwrap();

    let output = run_mlx_in(
        home.path(),
        &["--no-color", "record", "--simulate", "--count", "1"],
    );
    assert!(
        output.status.success(),
        "record failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ambient"));
    assert!(stdout.contains("°C"));

    let exported = fs::read_to_string(export_dir.join("mlx90632_data.csv")).unwrap();
    assert_eq!(exported.lines().count(), 2);
}

// =============================================================================
// Hardware Tests
// =============================================================================

#[test]
#[ignore = "requires BLE hardware"]
fn test_scan_json_output() {
    let output = run_mlx(&["scan", "--format", "json", "--timeout", "5"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(value["count"].is_number());
}

#[test]
#[ignore = "requires BLE hardware and device"]
fn test_record_hardware_csv() {
    let Some(device) = get_device() else {
        eprintln!("Skipping: MLX_DEVICE not set");
        return;
    };

    let output = run_mlx(&[
        "record",
        "--device",
        &device,
        "--count",
        "3",
        "--format",
        "csv",
        "--no-export",
    ]);
    assert!(
        output.status.success(),
        "record failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4);
}
