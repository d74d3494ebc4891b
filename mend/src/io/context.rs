//! Execution target abstraction for wrapped commands and installs.
//!
//! The [`ExecutionContext`] trait decouples the heal loop from where commands
//! actually run (currently the local host). Tests use scripted contexts that
//! return predetermined outputs without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::io::process::{self, DEFAULT_OUTPUT_LIMIT_BYTES, RunOutput};

/// A command to run on an execution target.
///
/// Built up in steps, then turned into a concrete [`Command`] by the context
/// that runs it. `render` exists for operator echoes; it joins words with
/// spaces and does no shell quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    workdir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            workdir: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// The command line as the operator should read it.
    pub fn render(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }

    /// Environment overrides set on this spec.
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Build the plain process command.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        self.apply(&mut cmd);
        cmd
    }

    /// Build the command wrapped in `sudo` for privilege elevation.
    pub fn to_elevated_command(&self) -> Command {
        let mut cmd = Command::new("sudo");
        cmd.arg(&self.program).args(&self.args);
        self.apply(&mut cmd);
        cmd
    }

    fn apply(&self, cmd: &mut Command) {
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
    }
}

/// Abstraction over the machine that runs commands and receives installs.
pub trait ExecutionContext {
    /// Human-readable name of the target, used in notices and quoted output.
    fn label(&self) -> &str;

    /// Resolve a binary name to its path on the target.
    ///
    /// Returns `Ok(None)` when the binary is not on the target's `PATH`.
    /// `Err` means the probe itself could not run; callers decide whether
    /// that counts as absent.
    fn locate_binary(&self, binary: &str) -> Result<Option<String>>;

    /// Run a command with stdout/stderr captured.
    fn run_captured(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<RunOutput>;

    /// Run a command under `sudo`, attached to the operator's terminal so
    /// elevation can prompt for credentials.
    fn run_elevated_attached(&self, spec: &CommandSpec) -> Result<RunOutput>;
}

/// The machine mend itself runs on.
#[derive(Debug, Clone)]
pub struct LocalHost {
    label: String,
    output_limit_bytes: usize,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::with_output_limit(DEFAULT_OUTPUT_LIMIT_BYTES)
    }

    pub fn with_output_limit(output_limit_bytes: usize) -> Self {
        Self {
            label: "localhost".to_string(),
            output_limit_bytes,
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for LocalHost {
    fn label(&self) -> &str {
        &self.label
    }

    #[instrument(skip_all, fields(binary))]
    fn locate_binary(&self, binary: &str) -> Result<Option<String>> {
        let spec = CommandSpec::new("which").args([binary]);
        let output = process::run_captured(spec.to_command(), None, self.output_limit_bytes)?;
        if !output.status.success() {
            debug!(binary, "binary not found");
            return Ok(None);
        }
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(binary, path = %path, "binary located");
        Ok((!path.is_empty()).then_some(path))
    }

    fn run_captured(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<RunOutput> {
        process::run_captured(spec.to_command(), timeout, self.output_limit_bytes)
    }

    fn run_elevated_attached(&self, spec: &CommandSpec) -> Result<RunOutput> {
        process::run_attached(spec.to_elevated_command())
    }
}
