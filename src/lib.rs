pub mod config;
pub mod core;
pub mod events;
pub mod execution;
pub mod logging;
pub mod report;

pub use config::{
    ArtifactsConfig, BuildToolsConfig, Config, ConfigError, FrameworkConfig, LogLevel, TestCaseBuilder,
    TestCaseConfig, YamlLoader, load_config_dir,
};
pub use core::environment::Environment;
pub use core::graph::{DependencyGraph, GraphError};
pub use core::selection::{Selection, TagSelector};
pub use core::testcase::{CaseStatus, CommandRecord, StateError, TestCase};
pub use core::types::{CaseName, RunId};
pub use events::{Event, EventBus, EventHandler, Severity, TracingHandler};
pub use execution::{
    BuildToolsResolver, CommandOutcome, ExecutionEngine, ExecutionError, ExecutionPlan,
    Passthrough, ProcessExecutor, ResolvedCommand, RunResult, RunSummary, ToolchainResolver,
};
pub use report::{CaseReport, ReportError, RunReport};
