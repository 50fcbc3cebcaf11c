//! Configuration error types.
//!
//! This module defines error types for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a specific file.
    #[error("failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML from a specific file.
    #[error("YAML parse error in '{path}': {source}")]
    YamlFileError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Failed to parse YAML.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A required configuration file does not exist.
    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    /// The test case file has no content.
    #[error("test case configuration is empty")]
    EmptyFile,

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// One entry of the test case list could not be parsed.
    #[error("test case #{index} is malformed: {source}")]
    MalformedCase {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// Two test cases share a name.
    #[error("duplicate test case name: {0}")]
    DuplicateCase(String),

    /// A configured toolchain directory does not exist.
    #[error("{what} directory does not exist: {}", path.display())]
    MissingDirectory { what: &'static str, path: PathBuf },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
