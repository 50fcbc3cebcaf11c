//! Core identifier types for the runner.
//!
//! These types provide type-safe identifiers for test cases and runs.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Unique name of a test case.
///
/// Ordering is plain string ordering, which is what the scheduler uses to
/// break ties between cases that become ready at the same time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseName(String);

/// Unique identifier for one invocation of the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl CaseName {
    /// Create a new CaseName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CaseName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CaseName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for CaseName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl RunId {
    /// Generate a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_case_name_display() {
        let name = CaseName::new("build_app");
        assert_eq!(format!("{}", name), "build_app");
        assert_eq!(name.as_str(), "build_app");
    }

    #[test]
    fn test_case_names_order_by_string() {
        let mut names = vec![CaseName::new("b"), CaseName::new("a"), CaseName::new("B")];
        names.sort();
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_case_name_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(CaseName::new("lint"), true);
        assert_eq!(map.get("lint"), Some(&true));
    }

    #[test]
    fn test_run_id_is_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
