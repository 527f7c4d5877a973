//! Black-box smoke checks for the `ats` binary.

use assert_cmd::Command;

#[test]
fn help_lists_the_server_flags() {
    let output = Command::cargo_bin("ats").unwrap().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--olc_server_port",
        "--ats_console_always_restart_olc_server",
        "--enable_ats_console_olc_server",
        "--enable_ats_console_olc_server_log",
        "--ats_console_olc_server_min_log_record_importance",
        "--ats_console_olc_server_path",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in help:\n{stdout}");
    }
}

#[test]
fn version_flag_prints_and_exits_zero() {
    Command::cargo_bin("ats")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}
