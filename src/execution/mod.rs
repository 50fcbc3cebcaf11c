//! Test case execution engine.
//!
//! This module provides the execution infrastructure for running test cases:
//! toolchain-aware command resolution, external process execution and the
//! sequential run loop.

mod engine;
mod plan;
mod process;
mod summary;
mod toolchain;

pub use engine::{ExecutionEngine, ExecutionError, RunResult};
pub use plan::ExecutionPlan;
pub use process::{CommandOutcome, EXIT_CODE_UNAVAILABLE, ProcessExecutor};
pub use summary::RunSummary;
pub use toolchain::{BuildToolsResolver, Passthrough, ResolvedCommand, ToolchainResolver};
