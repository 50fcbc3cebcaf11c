//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use caserun::{
    ExecutionEngine, ExecutionPlan, Passthrough, ProcessExecutor, RunResult, TagSelector,
    TestCaseBuilder, load_config_dir,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary configuration directory with a `work/` subdirectory that
/// test cases can use as their working directory.
pub struct ConfigDir {
    dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("work")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Working directory for commands.
    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Output directory configured by [`ConfigDir::write_default_config`].
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    pub fn write_config(&self, yaml: &str) {
        std::fs::write(self.dir.path().join("config.yaml"), yaml).unwrap();
    }

    /// A `config.yaml` pointing the output into this directory.
    pub fn write_default_config(&self) {
        self.write_config(&format!(
            "framework:\n  default_timeout: 30\n  output_dir: {}\n",
            self.output_dir().display()
        ));
    }

    /// Write `testcases.yaml`. `{work}` is replaced with the work directory.
    pub fn write_testcases(&self, yaml: &str) {
        let yaml = yaml.replace("{work}", &self.work_dir().display().to_string());
        std::fs::write(self.dir.path().join("testcases.yaml"), yaml).unwrap();
    }
}

/// Load the directory and run it the way the `run` command does.
pub async fn run_config_dir(dir: &Path, tags: &[&str]) -> RunResult {
    let config = load_config_dir(dir).unwrap();
    let cases = TestCaseBuilder::build_all(&config.testcases);
    let plan = ExecutionPlan::build(&cases, &TagSelector::new(tags.iter().copied())).unwrap();

    ExecutionEngine::new(
        ProcessExecutor::new(Arc::new(Passthrough)),
        config.framework.default_timeout(),
    )
    .run(&plan, cases)
    .await
    .unwrap()
}
