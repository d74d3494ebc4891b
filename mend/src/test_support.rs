//! Test-only scripted execution contexts and canned process outputs.

use std::cell::RefCell;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::io::context::{CommandSpec, ExecutionContext};
use crate::io::process::RunOutput;

/// Build an `ExitStatus` that reports the given exit code.
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Canned process output with the given exit code and stream contents.
pub fn output_with(code: i32, stdout: &str, stderr: &str) -> RunOutput {
    RunOutput {
        status: exit_status(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
        stdout_truncated: 0,
        stderr_truncated: 0,
        timed_out: false,
    }
}

/// Which execution capability a scripted run went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    Captured,
    ElevatedAttached,
}

/// One command a [`ScriptedContext`] was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub kind: RunKind,
    /// The rendered command line, without any sudo prefix.
    pub command: String,
    pub envs: Vec<(String, String)>,
}

/// Execution context that records commands instead of spawning them.
///
/// Probes answer from the scripted `apt_get` path, every run reports
/// success, and the full run sequence stays available via [`recorded`].
///
/// [`recorded`]: ScriptedContext::recorded
#[derive(Debug)]
pub struct ScriptedContext {
    label: String,
    apt_get: Option<String>,
    fail_probes: bool,
    runs: RefCell<Vec<RecordedRun>>,
}

impl ScriptedContext {
    /// A target where `which apt-get` resolves.
    pub fn with_apt_get() -> Self {
        Self {
            label: "scripted".to_string(),
            apt_get: Some("/usr/bin/apt-get".to_string()),
            fail_probes: false,
            runs: RefCell::new(Vec::new()),
        }
    }

    /// A target without apt-get, where installs fall back to Homebrew.
    pub fn without_apt_get() -> Self {
        Self {
            apt_get: None,
            ..Self::with_apt_get()
        }
    }

    /// A target whose probes error instead of answering.
    pub fn failing_probes() -> Self {
        Self {
            fail_probes: true,
            ..Self::with_apt_get()
        }
    }

    /// Every command run so far, in call order.
    pub fn recorded(&self) -> Vec<RecordedRun> {
        self.runs.borrow().clone()
    }

    fn record(&self, kind: RunKind, spec: &CommandSpec) {
        self.runs.borrow_mut().push(RecordedRun {
            kind,
            command: spec.render(),
            envs: spec.envs().to_vec(),
        });
    }
}

impl ExecutionContext for ScriptedContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn locate_binary(&self, binary: &str) -> Result<Option<String>> {
        if self.fail_probes {
            return Err(anyhow!("probe channel unavailable"));
        }
        if binary == "apt-get" {
            return Ok(self.apt_get.clone());
        }
        Ok(None)
    }

    fn run_captured(&self, spec: &CommandSpec, _timeout: Option<Duration>) -> Result<RunOutput> {
        self.record(RunKind::Captured, spec);
        Ok(output_with(0, "", ""))
    }

    fn run_elevated_attached(&self, spec: &CommandSpec) -> Result<RunOutput> {
        self.record(RunKind::ElevatedAttached, spec);
        Ok(output_with(0, "", ""))
    }
}
