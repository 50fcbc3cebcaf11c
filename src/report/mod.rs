//! Machine-readable run report.
//!
//! After a run, a JSON summary with per-case results is written to
//! `<output_dir>/summary.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::testcase::{CaseStatus, TestCase};
use crate::execution::RunResult;

/// Report file name inside the output directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output directory could not be created or the file written.
    #[error("failed to write report '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-case entry of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    /// Seconds spent running the case.
    pub duration: f64,
    pub commands: usize,
    pub executed_commands: usize,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&TestCase> for CaseReport {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name().to_string(),
            status: case.status(),
            duration: case.duration().as_secs_f64(),
            commands: case.commands().len(),
            executed_commands: case.executed_commands().len(),
            error_message: case.error_message().map(str::to_string),
            started_at: case.started_at(),
            finished_at: case.finished_at(),
        }
    }
}

/// Whole-run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `None` when every case was skipped.
    pub pass_rate: Option<f64>,
    /// Seconds spent on the whole run.
    pub duration: f64,
    pub cases: Vec<CaseReport>,
}

impl From<&RunResult> for RunReport {
    fn from(result: &RunResult) -> Self {
        let summary = &result.summary;
        Self {
            run_id: result.run_id.to_string(),
            generated_at: Utc::now(),
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            pass_rate: summary.pass_rate(),
            duration: summary.duration.as_secs_f64(),
            cases: result.cases.iter().map(CaseReport::from).collect(),
        }
    }
}

impl RunReport {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `summary.json` into `output_dir`, creating the directory.
    /// Returns the path written.
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(output_dir).map_err(|source| ReportError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let path = output_dir.join(SUMMARY_FILE);
        let json = self.to_json()?;
        std::fs::write(&path, json).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
