//! caserun - A declarative, dependency-aware test case runner.
//!
//! Usage:
//!   caserun run [--config-dir DIR] [--tags a,b]   Run the configured test cases
//!   caserun validate [--config-dir DIR]           Validate configuration and print the order

use caserun::{
    BuildToolsResolver, Config, DependencyGraph, EventBus, ExecutionEngine, ExecutionPlan,
    LogLevel, Passthrough, ProcessExecutor, RunReport, RunResult, TagSelector, TestCaseBuilder,
    ToolchainResolver, TracingHandler, load_config_dir, logging,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// caserun - A declarative, dependency-aware test case runner
#[derive(Parser)]
#[command(name = "caserun")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test cases
    Run {
        /// Directory containing config.yaml and testcases.yaml
        #[arg(long, value_name = "DIR", default_value = ".")]
        config_dir: PathBuf,

        /// Only run cases carrying one of these tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Validate configuration files and print the execution order
    Validate {
        /// Directory containing config.yaml and testcases.yaml
        #[arg(long, value_name = "DIR", default_value = ".")]
        config_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config_dir, tags } => run(&config_dir, TagSelector::new(tags)).await,
        Commands::Validate { config_dir } => {
            logging::init_console(LogLevel::Info);
            validate(&config_dir)
        }
    }
}

/// Load configuration, run the selected cases and write the report.
async fn run(config_dir: &Path, selector: TagSelector) -> ExitCode {
    let config = match load_config_dir(config_dir) {
        Ok(config) => config,
        Err(e) => {
            logging::init_console(LogLevel::Info);
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let framework = &config.framework;
    if let Some(log_file) = logging::init_with_file(framework.log_level, &framework.output_dir) {
        info!("Log file: {}", log_file.display());
    }
    log_config(config_dir, &config);

    let cases = TestCaseBuilder::build_all(&config.testcases);
    let plan = match ExecutionPlan::build(&cases, &selector) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Dependency validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !selector.is_empty() {
        info!(
            "Filtered to {} test case(s) by tags: {}",
            plan.len(),
            selector.tags().join(", ")
        );
        let auto_included = &plan.selection().auto_included;
        if !auto_included.is_empty() {
            let names: Vec<&str> = auto_included.iter().map(|n| n.as_str()).collect();
            info!("Auto-included dependencies: {}", names.join(", "));
        }
    }
    if plan.is_empty() {
        warn!("No test cases to run");
    }

    let resolver: Arc<dyn ToolchainResolver> = match &framework.build_tools {
        Some(tools) => Arc::new(BuildToolsResolver::new(tools.clone())),
        None => Arc::new(Passthrough),
    };

    let event_bus = Arc::new(EventBus::new());
    event_bus.register(Arc::new(TracingHandler)).await;

    let engine = ExecutionEngine::new(ProcessExecutor::new(resolver), framework.default_timeout())
        .with_event_bus(event_bus);

    let result = match engine.run(&plan, cases).await {
        Ok(result) => result,
        Err(e) => {
            error!("Run aborted: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_summary(&result);

    match RunReport::from(&result).write_to(&framework.output_dir) {
        Ok(path) => info!("Report written to {}", path.display()),
        Err(e) => warn!("Failed to write report: {}", e),
    }

    if result.summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn log_config(config_dir: &Path, config: &Config) {
    match &config.framework_file {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => warn!(
            "config.yaml not found in {}, using default settings",
            config_dir.display()
        ),
    }
    let framework = &config.framework;
    info!(
        "Framework: log_level={}, default_timeout={}s, output_dir={}",
        framework.log_level,
        framework.default_timeout,
        framework.output_dir.display()
    );
    if framework.retry_on_failure > 0 {
        warn!(
            "retry_on_failure={} is accepted but failed cases are not retried",
            framework.retry_on_failure
        );
    }
    info!("Loaded {} test case(s)", config.testcases.len());
}

fn print_summary(result: &RunResult) {
    let summary = &result.summary;
    let rule = "=".repeat(70);

    info!("{}", rule);
    info!("Test Summary");
    info!("{}", rule);
    info!("Total test cases: {}", summary.total);
    info!("Passed: {}", summary.passed);
    info!("Failed: {}", summary.failed);
    info!("Skipped: {}", summary.skipped);
    info!("Pass rate: {}", summary.pass_rate_display());
    info!("Total time: {:.2}s", summary.duration.as_secs_f64());
    info!("");
    info!("Test case details:");
    for case in &result.cases {
        info!(
            "  [{}] {} ({:.2}s)",
            case.status(),
            case.name(),
            case.duration().as_secs_f64()
        );
        if let Some(message) = case.error_message() {
            info!("      Error: {}", message);
        }
    }
    info!("{}", rule);
}

/// Load and validate configuration, then print the execution order.
fn validate(config_dir: &Path) -> ExitCode {
    info!("Validating configuration in: {}", config_dir.display());

    let config = match load_config_dir(config_dir) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Configuration is valid: {} test case(s)",
        config.testcases.len()
    );

    let cases = TestCaseBuilder::build_all(&config.testcases);
    let graph = match DependencyGraph::from_cases(&cases) {
        Ok(graph) => graph,
        Err(e) => {
            error!("Dependency validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let order = match graph.validate().and_then(|_| graph.topological_sort()) {
        Ok(order) => order,
        Err(e) => {
            error!("Dependency validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Dependencies are valid (no circular dependencies)");
    println!("Execution order:");
    for (idx, name) in order.iter().enumerate() {
        let deps = graph.get_dependencies(name.as_str());
        if deps.is_empty() {
            println!("  {}. {}", idx + 1, name);
        } else {
            let deps: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
            println!("  {}. {} [depends on: {}]", idx + 1, name, deps.join(", "));
        }
    }
    ExitCode::SUCCESS
}
