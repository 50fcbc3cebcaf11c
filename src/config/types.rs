//! Configuration type definitions.
//!
//! `config.yaml` holds the framework-wide settings under a `framework` key,
//! `testcases.yaml` holds the list of test cases under a `testcases` key.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::error::ConfigError;

/// Default per-command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default directory for logs and reports.
pub const DEFAULT_OUTPUT_DIR: &str = "./test_results";

/// Top-level layout of `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub framework: FrameworkConfig,
}

/// Framework-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Timeout in seconds for commands of cases without an override.
    pub default_timeout: u64,
    /// Directory receiving the log file and the run report.
    pub output_dir: PathBuf,
    /// Minimum severity written to the log.
    pub log_level: LogLevel,
    /// Accepted for compatibility; failed cases are never retried.
    pub retry_on_failure: u32,
    /// Locations of the build toolchain used to resolve command aliases.
    pub build_tools: Option<BuildToolsConfig>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_level: LogLevel::default(),
            retry_on_failure: 0,
            build_tools: None,
        }
    }
}

impl FrameworkConfig {
    /// The default timeout as a duration.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout)
    }

    /// Validate values and toolchain directories.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout == 0 {
            return Err(ConfigError::InvalidConfig(
                "default_timeout must be greater than 0".into(),
            ));
        }
        if let Some(build_tools) = &self.build_tools {
            build_tools.validate()?;
        }
        Ok(())
    }
}

/// Log severity accepted in `log_level` (case-insensitive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidConfig(format!(
                "invalid log level: {}, must be one of: DEBUG, INFO, WARNING, ERROR",
                s
            ))),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Build toolchain locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildToolsConfig {
    /// ohpm package manager installation.
    pub ohpm_home: PathBuf,
    /// hvigor build tool installation.
    pub hvigor_home: PathBuf,
    /// DevEco SDK.
    pub deveco_sdk_home: PathBuf,
    /// OpenHarmony base SDK.
    pub ohos_base_sdk_home: PathBuf,
    /// Node.js installation; `node` from `PATH` when absent.
    #[serde(default)]
    pub node_home: Option<PathBuf>,
    /// JDK installation.
    #[serde(default)]
    pub java_home: Option<PathBuf>,
}

impl BuildToolsConfig {
    /// Check that every configured home is set and exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("ohpm_home", &self.ohpm_home),
            ("hvigor_home", &self.hvigor_home),
            ("deveco_sdk_home", &self.deveco_sdk_home),
            ("ohos_base_sdk_home", &self.ohos_base_sdk_home),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, path)| path.as_os_str().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "build_tools.{}",
                missing.join(", build_tools.")
            )));
        }

        check_dir("OHPM home", &self.ohpm_home)?;
        check_dir("Hvigor home", &self.hvigor_home)?;
        check_dir("DevEco SDK home", &self.deveco_sdk_home)?;
        check_dir("OHOS base SDK home", &self.ohos_base_sdk_home)?;
        if let Some(node_home) = &self.node_home {
            check_dir("Node home", node_home)?;
        }
        if let Some(java_home) = &self.java_home {
            check_dir("Java home", java_home)?;
        }
        Ok(())
    }
}

fn check_dir(what: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingDirectory {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Top-level layout of `testcases.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCasesFile {
    /// Raw entries, parsed one by one to report the failing index.
    pub testcases: Option<Vec<serde_yaml::Value>>,
}

/// Post-run artifact declarations of a test case.
///
/// The structure is checked on load; the runner does not act on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Files expected to exist after the case ran.
    #[serde(default)]
    pub verify_files: Vec<String>,
    /// Commands as argument vectors.
    #[serde(default)]
    pub action: Vec<Vec<String>>,
}

/// One declared test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseConfig {
    /// Unique name.
    pub name: String,
    /// Working directory of every command.
    pub path: PathBuf,
    /// Commands as argument vectors, run in order.
    pub commands: Vec<Vec<String>>,
    /// Labels used for selection.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names of cases that must pass first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Per-command timeout override in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub artifacts: Option<ArtifactsConfig>,
}

impl TestCaseConfig {
    /// Structural checks that do not need the other cases.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "test case name cannot be empty".into(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "test case '{}' path cannot be empty",
                self.name
            )));
        }
        if self.commands.is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "test case '{}' must have at least one command",
                self.name
            )));
        }
        if let Some(idx) = self.commands.iter().position(|cmd| cmd.is_empty()) {
            return Err(ConfigError::InvalidConfig(format!(
                "test case '{}' command #{} is empty",
                self.name, idx
            )));
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidConfig(format!(
                "test case '{}' timeout must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Complete, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Framework settings.
    pub framework: FrameworkConfig,
    /// Declared test cases, in file order.
    pub testcases: Vec<TestCaseConfig>,
    /// File the framework settings came from; `None` when defaults were used.
    pub framework_file: Option<PathBuf>,
}

impl Config {
    /// Validate framework settings, every case, and name uniqueness.
    ///
    /// Dependency references are checked by the dependency graph.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.framework.validate()?;

        let mut names = HashSet::new();
        for testcase in &self.testcases {
            testcase.validate()?;
            if !names.insert(testcase.name.as_str()) {
                return Err(ConfigError::DuplicateCase(testcase.name.clone()));
            }
        }
        Ok(())
    }
}
