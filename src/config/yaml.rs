//! YAML configuration parsing.
//!
//! Parses the framework settings (`config.yaml`) and the test case list
//! (`testcases.yaml`).

use std::path::Path;
use tracing::debug;

use super::error::ConfigError;
use super::types::{ConfigFile, FrameworkConfig, TestCaseConfig, TestCasesFile};

/// Keys accepted in a test case entry and otherwise ignored.
const IGNORED_CASE_KEYS: &[&str] = &["hooks", "validation"];

/// YAML configuration loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load framework configuration from a file.
    pub fn load_framework_config(path: impl AsRef<Path>) -> Result<FrameworkConfig, ConfigError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        Self::parse_framework_config(&content).map_err(|e| with_path(e, path))
    }

    /// Parse framework configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn parse_framework_config(yaml: &str) -> Result<FrameworkConfig, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(FrameworkConfig::default());
        }
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        file.framework.validate()?;
        Ok(file.framework)
    }

    /// Load the test case list from a file.
    pub fn load_testcases(path: impl AsRef<Path>) -> Result<Vec<TestCaseConfig>, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let content = read_file(path)?;
        Self::parse_testcases(&content).map_err(|e| with_path(e, path))
    }

    /// Parse the test case list from a YAML string.
    ///
    /// Entries are validated individually; uniqueness across entries is
    /// checked by [`Config::validate`](super::Config::validate).
    pub fn parse_testcases(yaml: &str) -> Result<Vec<TestCaseConfig>, ConfigError> {
        if yaml.trim().is_empty() {
            return Err(ConfigError::EmptyFile);
        }
        let file: TestCasesFile = serde_yaml::from_str(yaml)?;
        let entries = file
            .testcases
            .ok_or_else(|| ConfigError::MissingField("testcases".into()))?;

        let mut testcases = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            log_ignored_keys(index, &entry);
            let testcase: TestCaseConfig = serde_yaml::from_value(entry)
                .map_err(|source| ConfigError::MalformedCase { index, source })?;
            testcase.validate()?;
            testcases.push(testcase);
        }
        Ok(testcases)
    }
}

fn log_ignored_keys(index: usize, entry: &serde_yaml::Value) {
    let Some(mapping) = entry.as_mapping() else {
        return;
    };
    for key in IGNORED_CASE_KEYS {
        if mapping.contains_key(*key) {
            debug!(index, key, "Ignoring test case key");
        }
    }
    if mapping.contains_key("artifacts") {
        debug!(index, "Artifacts are validated but not collected");
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
        path: path.to_path_buf(),
        source,
    })
}

fn with_path(err: ConfigError, path: &Path) -> ConfigError {
    match err {
        ConfigError::YamlError(source) => ConfigError::YamlFileError {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
