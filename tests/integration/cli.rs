//! Command line interface tests.

use std::process::{Command, Output};

use crate::common::ConfigDir;

fn caserun(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_caserun"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn config_dir_arg(dir: &ConfigDir) -> String {
    dir.path().display().to_string()
}

#[test]
fn test_validate_prints_execution_order() {
    let dir = ConfigDir::new();
    dir.write_testcases(
        r#"
testcases:
  - name: test
    path: {work}
    commands: [["true"]]
    dependencies: [build]
  - name: build
    path: {work}
    commands: [["true"]]
"#,
    );

    let output = caserun(&["validate", "--config-dir", &config_dir_arg(&dir)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. build"));
    assert!(stdout.contains("2. test [depends on: build]"));
}

#[test]
fn test_validate_fails_on_cycle() {
    let dir = ConfigDir::new();
    dir.write_testcases(
        r#"
testcases:
  - name: a
    path: {work}
    commands: [["true"]]
    dependencies: [a]
"#,
    );

    let output = caserun(&["validate", "--config-dir", &config_dir_arg(&dir)]);
    assert!(!output.status.success());
}

#[test]
fn test_run_exit_status_reflects_failures() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: good
    path: {work}
    commands: [["true"]]
    tags: [ok]
  - name: bad
    path: {work}
    commands: [["false"]]
    tags: [broken]
"#,
    );
    let config_dir = config_dir_arg(&dir);

    let passing = caserun(&["run", "--config-dir", &config_dir, "--tags", "ok"]);
    assert!(passing.status.success());

    let failing = caserun(&["run", "--config-dir", &config_dir]);
    assert!(!failing.status.success());

    assert!(dir.output_dir().join("summary.json").is_file());
}

#[test]
fn test_run_fails_without_testcases() {
    let dir = ConfigDir::new();
    let output = caserun(&["run", "--config-dir", &config_dir_arg(&dir)]);
    assert!(!output.status.success());
}
