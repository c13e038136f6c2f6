use crate::jobs::JobList;
use crate::process::ProcessControl;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: overrides consulted before the real process environment.
/// - `current_dir`: the shell's working directory.
/// - `should_exit`: a flag the read loop checks to know when to terminate.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory of the shell.
    pub current_dir: PathBuf,
    /// When set to true, the read loop stops after the current line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current working directory; variables are read through from
    /// the process environment on demand.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a command may read or change: the environment, the job
/// registry, and the process-control primitives used to manage jobs.
///
/// One instance is owned by each [`crate::Interpreter`]; nothing is global.
pub struct ShellState {
    pub env: Environment,
    pub jobs: JobList,
    pub process: Box<dyn ProcessControl>,
}

impl ShellState {
    pub fn new(process: Box<dyn ProcessControl>) -> Self {
        Self {
            env: Environment::new(),
            jobs: JobList::new(),
            process,
        }
    }
}
