//! Configuration loading and parsing.
//!
//! This module provides YAML-based configuration for the framework settings
//! and the declared test cases.

mod builder;
mod error;
mod types;
mod yaml;

pub use builder::{CONFIG_FILE, TESTCASES_FILE, TestCaseBuilder, load_config_dir};
pub use error::ConfigError;
pub use types::{
    ArtifactsConfig, BuildToolsConfig, Config, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS, FrameworkConfig, LogLevel,
    TestCaseConfig,
};
pub use yaml::YamlLoader;
