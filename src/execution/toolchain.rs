//! Command resolution against a configured build toolchain.
//!
//! Before a command is spawned, its first element may name a toolchain
//! launcher (`hvigor`, `ohpm`) rather than a real executable. A
//! [`ToolchainResolver`] rewrites such aliases into a fully qualified
//! invocation and supplies the environment the toolchain expects.

use std::path::{Path, PathBuf};

use crate::config::BuildToolsConfig;
use crate::core::environment::Environment;

/// A command ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Overrides applied on top of the inherited environment.
    pub environment: Environment,
}

impl ResolvedCommand {
    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Space-joined rendering for logs.
    pub fn display(&self) -> String {
        self.argv().join(" ")
    }
}

/// Turns a configured command vector into a [`ResolvedCommand`].
pub trait ToolchainResolver: Send + Sync {
    /// Resolve `command`. Returns `None` for an empty vector.
    fn resolve(&self, command: &[String]) -> Option<ResolvedCommand>;
}

/// Runs commands exactly as configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ToolchainResolver for Passthrough {
    fn resolve(&self, command: &[String]) -> Option<ResolvedCommand> {
        let (program, args) = command.split_first()?;
        Some(ResolvedCommand {
            program: program.clone(),
            args: args.to_vec(),
            environment: Environment::new(),
        })
    }
}

/// Resolves `hvigor` and `ohpm` against configured installation homes.
#[derive(Debug, Clone)]
pub struct BuildToolsResolver {
    tools: BuildToolsConfig,
    environment: Environment,
}

impl BuildToolsResolver {
    pub fn new(tools: BuildToolsConfig) -> Self {
        let environment = toolchain_environment(&tools);
        Self { tools, environment }
    }

    /// Environment injected into every command.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    fn node(&self) -> String {
        let node = executable_name("node");
        match &self.tools.node_home {
            Some(home) => path_string(&home.join(node)),
            None => node,
        }
    }
}

impl ToolchainResolver for BuildToolsResolver {
    fn resolve(&self, command: &[String]) -> Option<ResolvedCommand> {
        let (first, rest) = command.split_first()?;

        let (program, args) = match first.as_str() {
            "hvigor" => {
                let script = self.tools.hvigor_home.join("bin").join("hvigorw.js");
                let mut args = Vec::with_capacity(rest.len() + 1);
                args.push(path_string(&script));
                args.extend_from_slice(rest);
                (self.node(), args)
            }
            "ohpm" => {
                let ohpm = self
                    .tools
                    .ohpm_home
                    .join("bin")
                    .join(executable_name("ohpm"));
                (path_string(&ohpm), rest.to_vec())
            }
            _ => (first.clone(), rest.to_vec()),
        };

        Some(ResolvedCommand {
            program,
            args,
            environment: self.environment.clone(),
        })
    }
}

/// Variables and search path entries for a toolchain.
///
/// `bin` directories are prepended in the order ohpm, hvigor, java so that
/// java ends up first.
fn toolchain_environment(tools: &BuildToolsConfig) -> Environment {
    let mut env = Environment::new();

    env.set("OHPM_HOME", path_string(&tools.ohpm_home));
    prepend_if_dir(&mut env, tools.ohpm_home.join("bin"));

    env.set("HVIGOR_HOME", path_string(&tools.hvigor_home));
    prepend_if_dir(&mut env, tools.hvigor_home.join("bin"));

    env.set("DEVECO_SDK_HOME", path_string(&tools.deveco_sdk_home));
    env.set("OHOS_BASE_SDK_HOME", path_string(&tools.ohos_base_sdk_home));

    if let Some(java_home) = &tools.java_home {
        env.set("JAVA_HOME", path_string(java_home));
        prepend_if_dir(&mut env, java_home.join("bin"));
    }
    env
}

fn prepend_if_dir(env: &mut Environment, dir: PathBuf) {
    if dir.is_dir() {
        env.prepend_path(dir);
    }
}

fn executable_name(base: &str) -> String {
    if cfg!(windows) {
        format!("{base}.exe")
    } else {
        base.to_string()
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
