//! Test case entity and its run-time state machine.
//!
//! A [`TestCase`] is created once from validated configuration and then
//! mutated only by the execution engine:
//!
//! ```text
//! Pending --start--> Running --finish(ok)--> Passed
//!                            --finish(err)-> Failed
//! Pending --skip---> Skipped
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::types::CaseName;

/// Width of the banner separating per-command output blocks.
const BANNER_WIDTH: usize = 60;

/// Errors raised by an illegal status transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The requested transition is not part of the state machine.
    #[error("test case '{case}' cannot move from {from} to {to}")]
    InvalidTransition {
        case: CaseName,
        from: CaseStatus,
        to: CaseStatus,
    },
}

/// Status of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    /// Waiting to be executed.
    Pending,
    /// Commands are being executed.
    Running,
    /// Every command succeeded.
    Passed,
    /// A command failed.
    Failed,
    /// Not executed because a dependency did not pass.
    Skipped,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Pending => "PENDING",
            CaseStatus::Running => "RUNNING",
            CaseStatus::Passed => "PASSED",
            CaseStatus::Failed => "FAILED",
            CaseStatus::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// Outcome of one executed command, kept in the case's execution log.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// The command as configured (before toolchain resolution).
    pub command: Vec<String>,
    /// Whether the command succeeded.
    pub success: bool,
    /// Captured output, or the failure message when nothing ran.
    pub output: String,
    /// Exit code, `-1` when the process did not exit on its own.
    pub exit_code: i32,
    /// Wall time spent on the command.
    pub duration: Duration,
}

/// A named unit of work: a working directory and an ordered list of commands.
#[derive(Debug, Clone)]
pub struct TestCase {
    name: CaseName,
    path: PathBuf,
    commands: Vec<Vec<String>>,
    tags: BTreeSet<String>,
    dependencies: Vec<CaseName>,
    timeout: Option<Duration>,

    status: CaseStatus,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    duration: Duration,
    output: String,
    error_message: Option<String>,
    executed_commands: Vec<CommandRecord>,
}

impl TestCase {
    /// Create a pending test case.
    pub fn new(
        name: impl Into<CaseName>,
        path: impl Into<PathBuf>,
        commands: Vec<Vec<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            commands,
            tags: BTreeSet::new(),
            dependencies: Vec::new(),
            timeout: None,
            status: CaseStatus::Pending,
            started: None,
            started_at: None,
            finished_at: None,
            duration: Duration::ZERO,
            output: String::new(),
            error_message: None,
            executed_commands: Vec::new(),
        }
    }

    /// Builder: set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the dependencies, keeping their declared order.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CaseName>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: override the framework-wide timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &CaseName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commands(&self) -> &[Vec<String>] {
        &self.commands
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn dependencies(&self) -> &[CaseName] {
        &self.dependencies
    }

    /// Timeout override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Timeout to apply: the override, else `default`.
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    /// Whether the case carries at least one of `filter`.
    pub fn has_any_tag(&self, filter: &[String]) -> bool {
        filter.iter().any(|tag| self.tags.contains(tag))
    }

    pub fn status(&self) -> CaseStatus {
        self.status
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Concatenated output of every command that produced any.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Failure or skip reason.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn executed_commands(&self) -> &[CommandRecord] {
        &self.executed_commands
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// `Pending -> Running`.
    pub fn start(&mut self) -> Result<(), StateError> {
        self.transition(CaseStatus::Pending, CaseStatus::Running)?;
        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// `Running -> Passed` or `Running -> Failed`.
    ///
    /// The message is only kept for failures.
    pub fn finish(&mut self, success: bool, message: impl Into<String>) -> Result<(), StateError> {
        let to = if success {
            CaseStatus::Passed
        } else {
            CaseStatus::Failed
        };
        self.transition(CaseStatus::Running, to)?;

        self.finished_at = Some(Utc::now());
        if let Some(started) = self.started {
            self.duration = started.elapsed();
        }
        if !success {
            self.error_message = Some(message.into());
        }
        Ok(())
    }

    /// `Pending -> Skipped`.
    pub fn skip(&mut self, reason: impl Into<String>) -> Result<(), StateError> {
        self.transition(CaseStatus::Pending, CaseStatus::Skipped)?;
        self.finished_at = Some(Utc::now());
        self.error_message = Some(reason.into());
        Ok(())
    }

    /// Append a command outcome to the execution log.
    pub fn add_command_result(&mut self, record: CommandRecord) {
        if !record.output.is_empty() {
            let banner = "=".repeat(BANNER_WIDTH);
            self.output.push('\n');
            self.output.push_str(&banner);
            self.output.push_str("\nCommand: ");
            self.output.push_str(&record.command.join(" "));
            self.output.push('\n');
            self.output.push_str(&banner);
            self.output.push('\n');
            self.output.push_str(&record.output);
        }
        self.executed_commands.push(record);
    }

    fn transition(&mut self, expected: CaseStatus, to: CaseStatus) -> Result<(), StateError> {
        if self.status != expected {
            return Err(StateError::InvalidTransition {
                case: self.name.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
