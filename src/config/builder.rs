//! Test case builder from YAML configuration.
//!
//! This module turns a configuration directory into a validated [`Config`]
//! and converts [`TestCaseConfig`] entries into runnable [`TestCase`]s.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::core::testcase::TestCase;

use super::error::ConfigError;
use super::types::{Config, FrameworkConfig, TestCaseConfig};
use super::yaml::YamlLoader;

/// Framework settings file name.
pub const CONFIG_FILE: &str = "config.yaml";

/// Test case list file name.
pub const TESTCASES_FILE: &str = "testcases.yaml";

/// Builder for creating test cases from YAML configuration.
pub struct TestCaseBuilder;

impl TestCaseBuilder {
    /// Build a pending test case from its configuration.
    pub fn build(config: &TestCaseConfig) -> TestCase {
        let mut testcase = TestCase::new(
            config.name.as_str(),
            config.path.clone(),
            config.commands.clone(),
        )
        .with_tags(config.tags.iter().map(String::as_str))
        .with_dependencies(config.dependencies.iter().map(String::as_str));

        if let Some(secs) = config.timeout {
            testcase = testcase.with_timeout(Duration::from_secs(secs));
        }
        testcase
    }

    /// Build every configured test case, preserving declaration order.
    pub fn build_all(configs: &[TestCaseConfig]) -> Vec<TestCase> {
        configs.iter().map(Self::build).collect()
    }
}

/// Load and validate `config.yaml` and `testcases.yaml` from a directory.
///
/// `config.yaml` is optional and falls back to defaults; `testcases.yaml`
/// is required.
pub fn load_config_dir(dir: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ConfigError::InvalidConfig(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let config_path = dir.join(CONFIG_FILE);
    let (framework, framework_file) = if config_path.is_file() {
        debug!(path = %config_path.display(), "Loading framework configuration");
        (
            YamlLoader::load_framework_config(&config_path)?,
            Some(config_path),
        )
    } else {
        (FrameworkConfig::default(), None)
    };

    let testcases_path: PathBuf = dir.join(TESTCASES_FILE);
    debug!(path = %testcases_path.display(), "Loading test cases");
    let testcases = YamlLoader::load_testcases(&testcases_path)?;

    let config = Config {
        framework,
        testcases,
        framework_file,
    };
    config.validate()?;
    Ok(config)
}
