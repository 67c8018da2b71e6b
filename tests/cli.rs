use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

const OVERRIDE_VARS: &[&str] = &[
    "PERMAQR_URL",
    "PERMAQR_OUTPUT",
    "PERMAQR_VERSION",
    "PERMAQR_EC_LEVEL",
    "PERMAQR_BOX_SIZE",
    "PERMAQR_BORDER",
    "PERMAQR_FIT",
    "PERMAQR_FILL_COLOR",
    "PERMAQR_BACK_COLOR",
    "PERMAQR_VERIFY",
    "PERMAQR_LOG_LEVEL",
    "PERMAQR_LOG_FILE",
    "PERMAQR_LOG_COLOR",
    "PERMAQR_LOG_ROTATION",
    "XDG_CONFIG_HOME",
];

fn permaqr(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_permaqr"));
    cmd.current_dir(dir).args(args);
    for var in OVERRIDE_VARS {
        cmd.env_remove(var);
    }
    cmd.envs(env.iter().copied());
    cmd.output().expect("run permaqr")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn image_width(path: &Path) -> u32 {
    image::open(path).expect("open generated png").width()
}

#[test]
fn default_run_prints_single_confirmation_line() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = permaqr(dir.path(), &[], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Saved as my_permanent_qr.png\n");
    let path = dir.path().join("my_permanent_qr.png");
    assert_eq!(image_width(&path), 330);
}

#[test]
fn json_flag_prints_report() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = permaqr(dir.path(), &["--json", "-o", "qr.png"], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).expect("parse json report");
    assert_eq!(report["path"], "qr.png");
    assert_eq!(report["requested_version"], 2);
    assert_eq!(report["version"], 3);
    assert_eq!(report["ec_level"], "H");
    assert_eq!(report["width"], 330);
    assert!(dir.path().join("qr.png").exists());
}

#[test]
fn unwritable_output_exits_non_zero_with_diagnostic() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = permaqr(dir.path(), &["-o", "missing/dir/qr.png"], &[]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    let message = stderr(&output);
    assert!(message.contains("I/O error"), "stderr: {message}");
    assert!(message.contains("missing/dir/qr.png"), "stderr: {message}");
}

#[test]
fn payload_over_capacity_without_fit_fails() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = permaqr(dir.path(), &["--no-fit", "-o", "qr.png"], &[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to encode QR code"));
    assert!(!dir.path().join("qr.png").exists());
}

#[test]
fn flags_beat_environment_beats_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("permaqr.toml"), "[qr]\nbox_size = 4\n").unwrap();

    let output = permaqr(dir.path(), &["-o", "file.png"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(image_width(&dir.path().join("file.png")), 33 * 4);

    let env = [("PERMAQR_BOX_SIZE", "6")];
    let output = permaqr(dir.path(), &["-o", "env.png"], &env);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(image_width(&dir.path().join("env.png")), 33 * 6);

    let output = permaqr(dir.path(), &["-o", "flag.png", "--box-size", "8"], &env);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(image_width(&dir.path().join("flag.png")), 33 * 8);
}

#[test]
fn unparsable_environment_value_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = permaqr(dir.path(), &[], &[("PERMAQR_VERSION", "abc")]);

    assert!(!output.status.success());
    let message = stderr(&output);
    assert!(message.contains("PERMAQR_VERSION"), "stderr: {message}");
    assert!(!dir.path().join("my_permanent_qr.png").exists());
}

#[test]
fn discovered_config_file_is_logged() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("permaqr.toml"), "url = \"https://example.com\"\n").unwrap();

    let output = permaqr(
        dir.path(),
        &[],
        &[("PERMAQR_LOG_LEVEL", "info"), ("PERMAQR_LOG_COLOR", "false")],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Using configuration file"));
    assert_eq!(stdout(&output), "Saved as my_permanent_qr.png\n");
}
