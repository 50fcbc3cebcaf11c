//! Aggregate counts of a finished run.

use std::fmt;
use std::time::Duration;

use crate::core::testcase::{CaseStatus, TestCase};
use crate::core::types::RunId;

/// Counts by status and the pass rate of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Wall time of the whole run.
    pub duration: Duration,
}

impl RunSummary {
    /// Count the statuses of `cases`.
    pub fn from_cases<'a>(
        run_id: RunId,
        cases: impl IntoIterator<Item = &'a TestCase>,
        duration: Duration,
    ) -> Self {
        let mut summary = Self {
            run_id,
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            duration,
        };
        for case in cases {
            summary.total += 1;
            match case.status() {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed => summary.failed += 1,
                CaseStatus::Skipped => summary.skipped += 1,
                CaseStatus::Pending | CaseStatus::Running => {}
            }
        }
        summary
    }

    /// `passed / (total - skipped) * 100`, or `None` when nothing ran.
    pub fn pass_rate(&self) -> Option<f64> {
        let executed = self.total.saturating_sub(self.skipped);
        if executed == 0 {
            None
        } else {
            Some(self.passed as f64 / executed as f64 * 100.0)
        }
    }

    /// Pass rate as `"66.67%"`, or `"N/A"`.
    pub fn pass_rate_display(&self) -> String {
        match self.pass_rate() {
            Some(rate) => format!("{:.2}%", rate),
            None => "N/A".to_string(),
        }
    }

    /// Whether any case ended `Failed`. Skips do not count.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, passed: {}, failed: {}, skipped: {}, pass rate: {}, duration: {:.2}s",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.pass_rate_display(),
            self.duration.as_secs_f64()
        )
    }
}
