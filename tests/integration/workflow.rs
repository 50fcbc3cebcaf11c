//! Complete workflow integration tests.
//!
//! Tests that verify the full pipeline from YAML configuration to execution.

use async_trait::async_trait;
use caserun::{
    CaseStatus, Event, EventBus, EventHandler, ExecutionEngine, ExecutionPlan, ProcessExecutor,
    RunReport, TagSelector, TestCaseBuilder, load_config_dir,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::common::{ConfigDir, run_config_dir};

/// Recording event handler for verifying events.
struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    async fn skipped(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                Event::CaseSkipped { case, .. } => Some(case.to_string()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}

#[tokio::test]
async fn test_pipeline_runs_in_dependency_order() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: verify
    path: {work}
    commands:
      - ["sh", "-c", "test -f built.txt && echo verified"]
    dependencies: [build]
  - name: build
    path: {work}
    commands:
      - ["sh", "-c", "echo artifact > built.txt"]
      - ["echo", "build done"]
"#,
    );

    let result = run_config_dir(dir.path(), &[]).await;

    let order: Vec<&str> = result.cases.iter().map(|c| c.name().as_str()).collect();
    assert_eq!(order, vec!["build", "verify"]);
    assert_eq!(result.summary.passed, 2);
    assert!(!result.summary.has_failures());

    let verify = result.get_case("verify").unwrap();
    assert!(verify.output().contains("verified"));
    assert!(verify.started_at().is_some());
    assert!(verify.finished_at().is_some());
}

#[tokio::test]
async fn test_failure_propagates_as_skip() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: A
    path: {work}
    commands: [["sh", "-c", "echo compiling; exit 1"]]
  - name: B
    path: {work}
    commands: [["true"]]
    dependencies: [A]
  - name: C
    path: {work}
    commands: [["true"]]
"#,
    );

    let result = run_config_dir(dir.path(), &[]).await;

    let a = result.get_case("A").unwrap();
    assert_eq!(a.status(), CaseStatus::Failed);
    assert_eq!(a.executed_commands()[0].exit_code, 1);
    assert!(a.output().contains("compiling"));

    let b = result.get_case("B").unwrap();
    assert_eq!(b.status(), CaseStatus::Skipped);
    assert!(b.error_message().unwrap().contains("'A'"));

    assert_eq!(result.get_case("C").unwrap().status(), CaseStatus::Passed);
    assert!(result.summary.has_failures());
    assert_eq!(result.summary.pass_rate_display(), "50.00%");
}

#[tokio::test]
async fn test_case_timeout_from_yaml() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: hangs
    path: {work}
    timeout: 1
    commands: [["sleep", "10"]]
"#,
    );

    let started = Instant::now();
    let result = run_config_dir(dir.path(), &[]).await;

    let hangs = result.get_case("hangs").unwrap();
    assert_eq!(hangs.status(), CaseStatus::Failed);
    let record = &hangs.executed_commands()[0];
    assert_eq!(record.exit_code, -1);
    assert!(record.duration >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_independent_cases_ordered_by_name() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: zeta
    path: {work}
    commands: [["true"]]
  - name: alpha
    path: {work}
    commands: [["true"]]
  - name: mid
    path: {work}
    commands: [["true"]]
"#,
    );

    let result = run_config_dir(dir.path(), &[]).await;
    let order: Vec<&str> = result.cases.iter().map(|c| c.name().as_str()).collect();
    assert_eq!(order, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn test_events_and_report() {
    let dir = ConfigDir::new();
    dir.write_default_config();
    dir.write_testcases(
        r#"
testcases:
  - name: broken
    path: {work}
    commands: [["false"]]
  - name: downstream
    path: {work}
    commands: [["true"]]
    dependencies: [broken]
"#,
    );

    let config = load_config_dir(dir.path()).unwrap();
    let cases = TestCaseBuilder::build_all(&config.testcases);
    let plan = ExecutionPlan::build(&cases, &TagSelector::default()).unwrap();

    let handler = RecordingHandler::new();
    let bus = Arc::new(EventBus::new());
    bus.register(handler.clone()).await;

    let result = ExecutionEngine::new(
        ProcessExecutor::default(),
        config.framework.default_timeout(),
    )
    .with_event_bus(bus)
    .run(&plan, cases)
    .await
    .unwrap();

    assert_eq!(handler.skipped().await, vec!["downstream".to_string()]);

    let path = RunReport::from(&result)
        .write_to(&config.framework.output_dir)
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["failed"], 1);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["cases"][0]["name"], "broken");
    assert_eq!(json["cases"][0]["status"], "FAILED");
    assert_eq!(json["cases"][1]["status"], "SKIPPED");
    assert_eq!(
        json["cases"][1]["error_message"],
        "dependency 'broken' failed"
    );
}
