//! Tag selection integration tests.

use caserun::CaseStatus;

use crate::common::{ConfigDir, run_config_dir};

const CASES: &str = r#"
testcases:
  - name: install
    path: {work}
    commands: [["true"]]
  - name: build
    path: {work}
    commands: [["true"]]
    dependencies: [install]
  - name: smoke-test
    path: {work}
    commands: [["true"]]
    tags: [smoke]
    dependencies: [build]
  - name: nightly-test
    path: {work}
    commands: [["true"]]
    tags: [nightly]
    dependencies: [build]
  - name: docs
    path: {work}
    commands: [["false"]]
    tags: [docs]
"#;

#[tokio::test]
async fn test_tag_pulls_in_dependency_chain() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(CASES);

    let result = run_config_dir(dir.path(), &["smoke"]).await;

    let order: Vec<&str> = result.cases.iter().map(|c| c.name().as_str()).collect();
    assert_eq!(order, vec!["install", "build", "smoke-test"]);
    assert!(result.cases.iter().all(|c| c.status() == CaseStatus::Passed));
}

#[tokio::test]
async fn test_multiple_tags_are_ored() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(CASES);

    let result = run_config_dir(dir.path(), &["smoke", "nightly"]).await;

    let order: Vec<&str> = result.cases.iter().map(|c| c.name().as_str()).collect();
    assert_eq!(
        order,
        vec!["install", "build", "nightly-test", "smoke-test"]
    );
    assert!(result.get_case("docs").is_none());
}

#[tokio::test]
async fn test_no_tags_runs_everything() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(CASES);

    let result = run_config_dir(dir.path(), &[]).await;
    assert_eq!(result.summary.total, 5);
    assert_eq!(result.summary.failed, 1);
}

#[tokio::test]
async fn test_unknown_tag_runs_nothing() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(CASES);

    let result = run_config_dir(dir.path(), &["release"]).await;
    assert_eq!(result.summary.total, 0);
    assert_eq!(result.summary.pass_rate_display(), "N/A");
}
