//! CLI contract tests.

use assert_cmd::Command;

fn riskscan() -> Command {
    match Command::cargo_bin("riskscan") {
        Ok(cmd) => cmd,
        Err(err) => panic!("binary should build: {err}"),
    }
}

#[test]
fn config_command_prints_effective_config_with_redacted_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = riskscan()
        .current_dir(dir.path())
        .env_remove("RISKSCAN_CONFIG_PATH")
        .env("RISKSCAN_API_KEY", "AIza-very-secret")
        .env("RISKSCAN_MODEL", "gemini-cli-test")
        .arg("config")
        .output()
        .expect("command runs");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gemini-cli-test"));
    assert!(stdout.contains("__REDACTED__"));
    assert!(!stdout.contains("AIza-very-secret"));
}

#[test]
fn scenario_rejects_unknown_bucket() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = riskscan()
        .current_dir(dir.path())
        .args(["scenario", "--users", "50"])
        .output()
        .expect("command runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("101-500"));
}

#[test]
fn scenario_against_unreachable_endpoint_reports_user_message() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = riskscan()
        .current_dir(dir.path())
        .env_remove("RISKSCAN_CONFIG_PATH")
        .env("RISKSCAN_BASE_URL", "http://127.0.0.1:9/v1beta/models")
        .args(["scenario", "--users", "101-500", "--platform", "Entra ID"])
        .output()
        .expect("command runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No se pudo generar el escenario"));
}

#[test]
fn config_command_falls_back_to_per_user_file() {
    let home = tempfile::tempdir().expect("temp home");
    let user_dir = home.path().join(".riskscan");
    std::fs::create_dir_all(&user_dir).expect("create user dir");
    std::fs::write(
        user_dir.join("riskscan.toml"),
        "[gateway]\nmodel = \"gemini-from-home\"\n",
    )
    .expect("write user config");
    let cwd = tempfile::tempdir().expect("temp dir");

    let output = riskscan()
        .current_dir(cwd.path())
        .env("HOME", home.path())
        .env_remove("RISKSCAN_CONFIG_PATH")
        .env_remove("RISKSCAN_MODEL")
        .arg("config")
        .output()
        .expect("command runs");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("gemini-from-home"));
}
