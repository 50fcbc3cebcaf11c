//! Lifecycle events and event handling.
//!
//! This module provides event emission for run, test case and command
//! lifecycle events. The engine only emits data; presentation belongs to the
//! registered handlers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::core::testcase::CaseStatus;
use crate::core::types::{CaseName, RunId};

/// How loudly an event should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Lifecycle events emitted during a run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A run has started with `total` cases in execution order.
    RunStarted {
        run_id: RunId,
        total: usize,
    },

    /// A test case has started execution.
    CaseStarted {
        case: CaseName,
        /// 1-based position in the execution order.
        position: usize,
        total: usize,
    },

    /// A command of a running case is about to be spawned.
    CommandStarted {
        case: CaseName,
        /// 1-based index within the case.
        index: usize,
        count: usize,
        command: Vec<String>,
    },

    /// A command has finished, successfully or not.
    CommandFinished {
        case: CaseName,
        index: usize,
        success: bool,
        exit_code: i32,
        duration: Duration,
    },

    /// A test case reached `Passed` or `Failed`.
    CaseFinished {
        case: CaseName,
        status: CaseStatus,
        duration: Duration,
        error: Option<String>,
    },

    /// A test case was not executed because of a dependency.
    CaseSkipped {
        case: CaseName,
        reason: String,
    },

    /// Every case in the plan reached a final state.
    RunCompleted {
        run_id: RunId,
        passed: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    },
}

impl Event {
    /// Severity a reporter should use for this event.
    pub fn severity(&self) -> Severity {
        match self {
            Event::CommandFinished { success: false, .. } => Severity::Error,
            Event::CaseFinished {
                status: CaseStatus::Failed,
                ..
            } => Severity::Error,
            Event::CaseSkipped { .. } => Severity::Warning,
            Event::RunCompleted { failed, .. } if *failed > 0 => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// Create a RunStarted event.
    pub fn run_started(run_id: RunId, total: usize) -> Self {
        Event::RunStarted {
            run_id,
            total,
        }
    }

    /// Create a CaseStarted event.
    pub fn case_started(case: CaseName, position: usize, total: usize) -> Self {
        Event::CaseStarted {
            case,
            position,
            total,
        }
    }

    /// Create a CommandStarted event.
    pub fn command_started(case: CaseName, index: usize, count: usize, command: Vec<String>) -> Self {
        Event::CommandStarted {
            case,
            index,
            count,
            command,
        }
    }

    /// Create a CommandFinished event.
    pub fn command_finished(
        case: CaseName,
        index: usize,
        success: bool,
        exit_code: i32,
        duration: Duration,
    ) -> Self {
        Event::CommandFinished {
            case,
            index,
            success,
            exit_code,
            duration,
        }
    }

    /// Create a CaseFinished event.
    pub fn case_finished(
        case: CaseName,
        status: CaseStatus,
        duration: Duration,
        error: Option<String>,
    ) -> Self {
        Event::CaseFinished {
            case,
            status,
            duration,
            error,
        }
    }

    /// Create a CaseSkipped event.
    pub fn case_skipped(case: CaseName, reason: impl Into<String>) -> Self {
        Event::CaseSkipped {
            case,
            reason: reason.into(),
        }
    }

    /// Create a RunCompleted event.
    pub fn run_completed(
        run_id: RunId,
        passed: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    ) -> Self {
        Event::RunCompleted {
            run_id,
            passed,
            failed,
            skipped,
            duration,
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Reports events through `tracing` at the event's severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

#[async_trait]
impl EventHandler for TracingHandler {
    async fn handle(&self, event: &Event) {
        let message = describe(event);
        match event.severity() {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::RunStarted { run_id, total, .. } => {
            format!("Run {} started with {} test case(s)", run_id, total)
        }
        Event::CaseStarted {
            case,
            position,
            total,
            ..
        } => format!("[{}/{}] Starting test case: {}", position, total, case),
        Event::CommandStarted {
            case,
            index,
            count,
            command,
            ..
        } => format!("[{}] [{}/{}] {}", case, index, count, command.join(" ")),
        Event::CommandFinished {
            case,
            index,
            success,
            exit_code,
            duration,
            ..
        } => {
            let verdict = if *success { "succeeded" } else { "failed" };
            format!(
                "[{}] command {} {} (exit code: {}, duration: {:.2}s)",
                case,
                index,
                verdict,
                exit_code,
                duration.as_secs_f64()
            )
        }
        Event::CaseFinished {
            case,
            status,
            duration,
            error,
            ..
        } => match error {
            Some(error) if *status == CaseStatus::Failed => format!(
                "Test case {}: {} (duration: {:.2}s): {}",
                status,
                case,
                duration.as_secs_f64(),
                error
            ),
            _ => format!(
                "Test case {}: {} (duration: {:.2}s)",
                status,
                case,
                duration.as_secs_f64()
            ),
        },
        Event::CaseSkipped { case, reason, .. } => {
            format!("Skipping test case {}: {}", case, reason)
        }
        Event::RunCompleted {
            run_id,
            passed,
            failed,
            skipped,
            duration,
            ..
        } => format!(
            "Run {} completed in {:.2}s: {} passed, {} failed, {} skipped",
            run_id,
            duration.as_secs_f64(),
            passed,
            failed,
            skipped
        ),
    }
}
