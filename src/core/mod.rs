//! Core domain types: test cases, their dependency graph, and tag selection.

pub mod environment;
pub mod graph;
pub mod selection;
pub mod testcase;
pub mod types;
