//! Configuration rejection tests.
//!
//! Every defect must be reported before any command runs.

use caserun::{
    ConfigError, ExecutionPlan, GraphError, TagSelector, TestCaseBuilder, load_config_dir,
};

use crate::common::ConfigDir;

#[test]
fn test_cycle_rejected_before_running() {
    let dir = ConfigDir::new();
    dir.write_testcases(
        r#"
testcases:
  - name: a
    path: {work}
    commands: [["touch", "ran-a"]]
    dependencies: [b]
  - name: b
    path: {work}
    commands: [["touch", "ran-b"]]
    dependencies: [a]
"#,
    );

    let config = load_config_dir(dir.path()).unwrap();
    let cases = TestCaseBuilder::build_all(&config.testcases);
    let result = ExecutionPlan::build(&cases, &TagSelector::default());

    assert!(matches!(result, Err(GraphError::CircularDependency(_))));
    assert!(!dir.work_dir().join("ran-a").exists());
}

#[test]
fn test_missing_dependency_names_both_cases() {
    let dir = ConfigDir::new();
    dir.write_testcases(
        r#"
testcases:
  - name: deploy
    path: {work}
    commands: [["true"]]
    dependencies: [package]
"#,
    );

    let config = load_config_dir(dir.path()).unwrap();
    let cases = TestCaseBuilder::build_all(&config.testcases);
    let err = ExecutionPlan::build(&cases, &TagSelector::default()).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("deploy"));
    assert!(message.contains("package"));
}

#[test]
fn test_missing_config_yaml_uses_defaults() {
    let dir = ConfigDir::new();
    dir.write_testcases("testcases:\n  - name: a\n    path: {work}\n    commands: [[\"true\"]]\n");

    let config = load_config_dir(dir.path()).unwrap();
    assert!(config.framework_file.is_none());
    assert_eq!(config.framework.default_timeout, 300);
}

#[test]
fn test_structural_defects_rejected() {
    let defects = [
        "testcases:\n  - name: a\n    path: {work}\n    commands: []\n",
        "testcases:\n  - name: a\n    path: {work}\n    commands: [[]]\n",
        "testcases:\n  - name: a\n    path: {work}\n    commands: [[\"true\"]]\n    timeout: 0\n",
        "testcases:\n  - name: ''\n    path: {work}\n    commands: [[\"true\"]]\n",
        "testcases:\n  - name: a\n    commands: [[\"true\"]]\n",
        "cases: []\n",
    ];

    for yaml in defects {
        let dir = ConfigDir::new();
        dir.write_testcases(yaml);
        assert!(
            load_config_dir(dir.path()).is_err(),
            "expected rejection of:\n{}",
            yaml
        );
    }
}

#[test]
fn test_invalid_framework_settings_rejected() {
    let dir = ConfigDir::new();
    dir.write_config("framework:\n  log_level: chatty\n");
    dir.write_testcases("testcases:\n  - name: a\n    path: {work}\n    commands: [[\"true\"]]\n");

    let err = load_config_dir(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::YamlFileError { .. }));
}
