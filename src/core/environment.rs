//! Environment variables injected into spawned commands.
//!
//! The child process inherits the runner's environment; the variables held
//! here are applied on top of it. `PATH` entries are prepended so that
//! configured toolchains win over whatever is installed system-wide.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// Name of the search path variable.
pub const PATH_VAR: &str = "PATH";

/// Overrides applied to a child process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Variables set verbatim.
    vars: BTreeMap<String, String>,

    /// Directories to put in front of the inherited `PATH`, first wins.
    path_prefix: Vec<PathBuf>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an environment variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an environment variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Get an environment variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Put `dir` in front of every directory added so far.
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        self.path_prefix.insert(0, dir.into());
    }

    /// Directories that will precede the inherited `PATH`.
    pub fn path_prefix(&self) -> &[PathBuf] {
        &self.path_prefix
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.path_prefix.is_empty()
    }

    /// Compute the `PATH` value for a child given the inherited one.
    ///
    /// Returns `None` when there is nothing to prepend.
    pub fn search_path(&self, inherited: Option<OsString>) -> Option<OsString> {
        if self.path_prefix.is_empty() {
            return None;
        }
        let mut dirs: Vec<PathBuf> = self.path_prefix.clone();
        if let Some(inherited) = inherited {
            dirs.extend(std::env::split_paths(&inherited));
        }
        std::env::join_paths(dirs).ok()
    }

    /// Apply the overrides to a command about to be spawned.
    pub fn apply(&self, cmd: &mut tokio::process::Command) {
        for (key, value) in &self.vars {
            cmd.env(key, value);
        }
        let inherited = self
            .vars
            .get(PATH_VAR)
            .map(OsString::from)
            .or_else(|| std::env::var_os(PATH_VAR));
        if let Some(path) = self.search_path(inherited) {
            cmd.env(PATH_VAR, path);
        }
    }
}
