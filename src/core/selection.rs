//! Tag-based selection of test cases.
//!
//! A case is selected when it carries at least one of the filter tags, or
//! when a selected case depends on it (directly or transitively). Cases that
//! only get in through the dependency closure are reported as auto-included.

use std::collections::{HashMap, HashSet};

use super::testcase::TestCase;
use super::types::CaseName;

/// Result of applying a tag filter to a set of test cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Every selected case, in declaration order.
    pub selected: Vec<CaseName>,
    /// Cases that matched a filter tag directly, in declaration order.
    pub matched: Vec<CaseName>,
    /// Cases selected only as dependencies, sorted by name.
    pub auto_included: Vec<CaseName>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.selected.iter().any(|n| n.as_str() == name)
    }

    /// The selected names as a set.
    pub fn to_set(&self) -> HashSet<CaseName> {
        self.selected.iter().cloned().collect()
    }
}

/// Filter of tags combined with OR semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelector {
    tags: Vec<String>,
}

impl TagSelector {
    /// Create a selector from a list of tags. Blank tags are ignored.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags
            .into_iter()
            .map(Into::into)
            .map(|t: String| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// Parse a comma-separated list such as `"smoke, basic"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// An empty selector keeps every case.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Compute the selected subset of `cases`.
    pub fn select(&self, cases: &[TestCase]) -> Selection {
        let all: Vec<CaseName> = cases.iter().map(|c| c.name().clone()).collect();
        if self.is_empty() {
            return Selection {
                selected: all.clone(),
                matched: all,
                auto_included: Vec::new(),
            };
        }

        let by_name: HashMap<&CaseName, &TestCase> =
            cases.iter().map(|c| (c.name(), c)).collect();

        let matched: Vec<CaseName> = cases
            .iter()
            .filter(|c| c.has_any_tag(&self.tags))
            .map(|c| c.name().clone())
            .collect();

        // Closure over dependency edges with an explicit stack. The visited
        // set bounds the walk on diamonds and on malformed cyclic input.
        let mut closure: HashSet<&CaseName> = HashSet::new();
        let mut stack: Vec<&CaseName> = matched.iter().collect();
        while let Some(name) = stack.pop() {
            if !closure.insert(name) {
                continue;
            }
            if let Some(case) = by_name.get(name) {
                stack.extend(
                    case.dependencies()
                        .iter()
                        .filter(|dep| !closure.contains(dep)),
                );
            }
        }

        let matched_set: HashSet<&CaseName> = matched.iter().collect();
        let mut auto_included: Vec<CaseName> = closure
            .iter()
            .filter(|name| !matched_set.contains(*name))
            .map(|name| (*name).clone())
            .collect();
        auto_included.sort();

        let selected = all
            .iter()
            .filter(|name| closure.contains(name))
            .cloned()
            .collect();

        Selection {
            selected,
            matched,
            auto_included,
        }
    }
}
