//! Test case execution engine.
//!
//! The `ExecutionEngine` walks an [`ExecutionPlan`] one case at a time. A
//! completion map (`name -> passed`) is updated right after each case
//! finishes; a case whose dependencies are not all `true` in the map is
//! skipped instead of run, which propagates failures forward through the
//! sorted order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Instrument, debug, info_span};

use crate::core::testcase::{CaseStatus, CommandRecord, StateError, TestCase};
use crate::core::types::{CaseName, RunId};
use crate::events::{Event, EventBus};

use super::plan::ExecutionPlan;
use super::process::ProcessExecutor;
use super::summary::RunSummary;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The plan names a case that was not handed to the engine.
    #[error("test case '{0}' is in the plan but was not provided")]
    UnknownCase(CaseName),

    /// A status transition was rejected.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: RunId,
    /// Executed cases in execution order, in their final state.
    pub cases: Vec<TestCase>,
    pub summary: RunSummary,
}

impl RunResult {
    /// Get a case by name.
    pub fn get_case(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name().as_str() == name)
    }

    /// Names of the cases that ended `Failed`.
    pub fn failed_cases(&self) -> Vec<&CaseName> {
        self.cases_with(CaseStatus::Failed)
    }

    /// Names of the cases that ended `Skipped`.
    pub fn skipped_cases(&self) -> Vec<&CaseName> {
        self.cases_with(CaseStatus::Skipped)
    }

    fn cases_with(&self, status: CaseStatus) -> Vec<&CaseName> {
        self.cases
            .iter()
            .filter(|c| c.status() == status)
            .map(|c| c.name())
            .collect()
    }
}

/// Runs test cases sequentially in plan order.
pub struct ExecutionEngine {
    executor: ProcessExecutor,
    default_timeout: Duration,
    event_bus: Option<Arc<EventBus>>,
}

impl ExecutionEngine {
    /// Create an engine that falls back to `default_timeout` for cases
    /// without an override.
    pub fn new(executor: ProcessExecutor, default_timeout: Duration) -> Self {
        Self {
            executor,
            default_timeout,
            event_bus: None,
        }
    }

    /// Emit lifecycle events on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Execute the plan.
    ///
    /// `cases` may contain cases outside the plan; those are dropped.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        cases: Vec<TestCase>,
    ) -> Result<RunResult, ExecutionError> {
        let run_id = RunId::new();
        let span = info_span!("run", run_id = %run_id, total = plan.len());
        self.run_plan(run_id, plan, cases).instrument(span).await
    }

    async fn run_plan(
        &self,
        run_id: RunId,
        plan: &ExecutionPlan,
        cases: Vec<TestCase>,
    ) -> Result<RunResult, ExecutionError> {
        let total = plan.len();
        let started = Instant::now();
        self.emit(Event::run_started(run_id, total)).await;

        let mut pending: HashMap<CaseName, TestCase> = cases
            .into_iter()
            .map(|case| (case.name().clone(), case))
            .collect();
        let mut completed: HashMap<CaseName, bool> = HashMap::with_capacity(total);
        let mut executed = Vec::with_capacity(total);

        for (idx, name) in plan.order().iter().enumerate() {
            let mut case = pending
                .remove(name)
                .ok_or_else(|| ExecutionError::UnknownCase(name.clone()))?;

            let passed = match blocking_dependency(&case, &completed) {
                Some(reason) => {
                    case.skip(reason.clone())?;
                    self.emit(Event::case_skipped(name.clone(), reason)).await;
                    false
                }
                None => self.run_case(&mut case, idx + 1, total).await?,
            };

            completed.insert(name.clone(), passed);
            executed.push(case);
        }

        let summary = RunSummary::from_cases(run_id, &executed, started.elapsed());
        self.emit(Event::run_completed(
            run_id,
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.duration,
        ))
        .await;

        Ok(RunResult {
            run_id,
            cases: executed,
            summary,
        })
    }

    /// Run every command of `case`, stopping at the first failure.
    /// Returns whether the case passed.
    async fn run_case(
        &self,
        case: &mut TestCase,
        position: usize,
        total: usize,
    ) -> Result<bool, ExecutionError> {
        let span = info_span!("test_case", case = %case.name());
        self.execute_case(case, position, total)
            .instrument(span)
            .await
    }

    async fn execute_case(
        &self,
        case: &mut TestCase,
        position: usize,
        total: usize,
    ) -> Result<bool, ExecutionError> {
        let name = case.name().clone();
        case.start()?;
        self.emit(Event::case_started(name.clone(), position, total))
            .await;

        let timeout = case.effective_timeout(self.default_timeout);
        let commands = case.commands().to_vec();
        let count = commands.len();
        let mut failure = None;

        for (idx, command) in commands.into_iter().enumerate() {
            self.emit(Event::command_started(
                name.clone(),
                idx + 1,
                count,
                command.clone(),
            ))
            .await;

            let outcome = self.executor.execute(&command, case.path(), timeout).await;

            self.emit(Event::command_finished(
                name.clone(),
                idx + 1,
                outcome.success,
                outcome.exit_code,
                outcome.duration,
            ))
            .await;

            if !outcome.success {
                let mut message = format!(
                    "command failed: {}\nexit code: {}",
                    command.join(" "),
                    outcome.exit_code
                );
                if let Some(error) = &outcome.error {
                    message.push('\n');
                    message.push_str(error);
                }
                failure = Some(message);
            }

            case.add_command_result(CommandRecord {
                command,
                success: outcome.success,
                output: outcome.output,
                exit_code: outcome.exit_code,
                duration: outcome.duration,
            });

            if failure.is_some() {
                debug!(
                    remaining = count - idx - 1,
                    "Abandoning remaining commands"
                );
                break;
            }
        }

        let passed = failure.is_none();
        case.finish(passed, failure.unwrap_or_default())?;
        self.emit(Event::case_finished(
            name,
            case.status(),
            case.duration(),
            case.error_message().map(str::to_string),
        ))
        .await;
        Ok(passed)
    }

    async fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event).await;
        }
    }
}

/// The first dependency, in declaration order, that did not pass.
fn blocking_dependency(case: &TestCase, completed: &HashMap<CaseName, bool>) -> Option<String> {
    case.dependencies()
        .iter()
        .find_map(|dep| match completed.get(dep) {
            None => Some(format!("dependency '{}' not yet executed", dep)),
            Some(false) => Some(format!("dependency '{}' failed", dep)),
            Some(true) => None,
        })
}
