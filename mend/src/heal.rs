//! The self-healing retry loop around a fallible operation.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::classify::classify;
use crate::io::context::ExecutionContext;
use crate::io::installer::{self, MissingDepReport, Resolution};
use crate::io::process::RunOutput;

/// One failed attempt of the wrapped operation.
///
/// `summary` is the one-line reason (exit status, signal, timeout).
/// `diagnostic` is the full text the classifier scans and the operator sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpFailure {
    pub summary: String,
    pub diagnostic: String,
}

impl OpFailure {
    /// Failure describing a finished process that did not succeed.
    pub fn from_output(output: &RunOutput) -> Self {
        let summary = if output.timed_out {
            "timed out".to_string()
        } else {
            match output.status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            }
        };
        Self {
            summary,
            diagnostic: output.combined_text(),
        }
    }

    /// Failure whose summary and diagnostic are the same text.
    pub fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            summary: text.clone(),
            diagnostic: text,
        }
    }
}

/// Why the heal loop stopped without the operation succeeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReport {
    /// The failure matched no dependency rule.
    Unrecognized { summary: String },
    /// A known dependency could not be resolved automatically.
    MissingDependency(MissingDepReport),
}

/// Summary of a heal-loop invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum HealOutcome<T> {
    /// The operation succeeded after `install_attempts` installs.
    Completed { value: T, install_attempts: u32 },
    /// The loop stopped; the caller maps the report to an exit code.
    Fatal(FatalReport),
}

/// Operator-visible moments in the loop, reported as they happen.
#[derive(Debug)]
pub enum HealEvent<'a> {
    /// The operation failed and the failure text matched a rule.
    MissingDependency {
        package: &'static str,
        failure: &'a OpFailure,
    },
    /// The operation failed and no rule matched; the loop is stopping.
    Unrecognized { failure: &'a OpFailure },
    /// An install attempt finished; the operation is about to rerun.
    Retrying,
}

/// Run `op` until it succeeds, installing missing dependencies in between.
///
/// Each failure is classified against the dependency rule table. A match
/// hands the package to the installer and the operation is retried; no match
/// stops the loop. The same dependency failing twice in a row stops the loop
/// too: the install didn't take, and retrying it would loop forever. That
/// repeat check is the only bound; there is no attempt counter.
///
/// Stops immediately with `Err` on failures of mend itself (probe or install
/// commands that cannot run at all).
#[instrument(skip_all, fields(auto_install, target = %ctx.label()))]
pub fn run_healed<C, T, F, E>(
    ctx: &C,
    auto_install: bool,
    mut op: F,
    mut on_event: E,
) -> Result<HealOutcome<T>>
where
    C: ExecutionContext,
    F: FnMut() -> Result<T, OpFailure>,
    E: FnMut(HealEvent<'_>),
{
    let mut last_failed: Option<&'static str> = None;
    let mut install_attempts = 0u32;

    loop {
        let failure = match op() {
            Ok(value) => {
                debug!(install_attempts, "operation succeeded");
                return Ok(HealOutcome::Completed {
                    value,
                    install_attempts,
                });
            }
            Err(failure) => failure,
        };

        let Some(package) = classify(&failure.diagnostic) else {
            debug!(summary = %failure.summary, "failure did not classify");
            on_event(HealEvent::Unrecognized { failure: &failure });
            return Ok(HealOutcome::Fatal(FatalReport::Unrecognized {
                summary: failure.summary,
            }));
        };

        // Consecutive repeats only: an install that ran and still left the
        // dependency missing is what stops the loop.
        let is_repeat = last_failed == Some(package);
        info!(package, is_repeat, "operation failed with missing dependency");
        on_event(HealEvent::MissingDependency {
            package,
            failure: &failure,
        });

        match installer::resolve_missing(ctx, package, is_repeat, auto_install)? {
            Resolution::Attempted => {
                install_attempts += 1;
                last_failed = Some(package);
                on_event(HealEvent::Retrying);
            }
            Resolution::GaveUp(report) => {
                return Ok(HealOutcome::Fatal(FatalReport::MissingDependency(report)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedContext, exit_status, output_with};

    fn scripted_op<T>(results: Vec<Result<T, OpFailure>>) -> impl FnMut() -> Result<T, OpFailure> {
        let mut queue = results.into_iter();
        move || queue.next().expect("operation run more times than scripted")
    }

    fn record_into(log: &mut Vec<String>) -> impl FnMut(HealEvent<'_>) + '_ {
        move |event| {
            log.push(match event {
                HealEvent::MissingDependency { package, .. } => format!("missing:{package}"),
                HealEvent::Unrecognized { .. } => "unrecognized".to_string(),
                HealEvent::Retrying => "retrying".to_string(),
            });
        }
    }

    /// A succeeding operation never touches the installer.
    #[test]
    fn success_runs_once_without_installs() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op(vec![Ok(42)]),
            record_into(&mut events),
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Completed {
                value: 42,
                install_attempts: 0
            }
        );
        assert!(ctx.recorded().is_empty());
        assert!(events.is_empty());
    }

    /// A classified failure triggers one install and a retry that succeeds.
    #[test]
    fn install_then_retry_completes() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op(vec![
                Err(OpFailure::message("/bin/sh: 1: autoconf: not found")),
                Ok("built"),
            ]),
            record_into(&mut events),
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Completed {
                value: "built",
                install_attempts: 1
            }
        );
        let runs = ctx.recorded();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].command, "apt-get install -y autoconf");
        assert_eq!(events, ["missing:autoconf", "retrying"]);
    }

    /// The same dependency failing twice in a row stops the loop, and the
    /// second failure does not trigger another install.
    #[test]
    fn repeated_dependency_stops_the_loop() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op::<()>(vec![
                Err(OpFailure::message("build: missing fswatch")),
                Err(OpFailure::message("build: missing fswatch")),
            ]),
            record_into(&mut events),
        )
        .expect("heal");

        let HealOutcome::Fatal(FatalReport::MissingDependency(report)) = outcome else {
            panic!("expected fatal missing dependency");
        };
        assert_eq!(report.package, "fswatch");
        assert!(!report.hint_install_flag);
        assert_eq!(ctx.recorded().len(), 1);
        assert_eq!(events, ["missing:fswatch", "retrying", "missing:fswatch"]);
    }

    /// An unclassifiable failure stops the loop without any install.
    #[test]
    fn unrecognized_failure_stops_immediately() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op::<()>(vec![Err(OpFailure::message(
                "Segmentation fault (core dumped)",
            ))]),
            record_into(&mut events),
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Fatal(FatalReport::Unrecognized {
                summary: "Segmentation fault (core dumped)".to_string()
            })
        );
        assert!(ctx.recorded().is_empty());
        assert_eq!(events, ["unrecognized"]);
    }

    /// Without auto mode the first classified failure already gives up, and
    /// the report suggests the flag.
    #[test]
    fn manual_mode_gives_up_on_first_failure() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            false,
            scripted_op::<()>(vec![Err(OpFailure::message("msgfmt: not found"))]),
            record_into(&mut events),
        )
        .expect("heal");

        let HealOutcome::Fatal(FatalReport::MissingDependency(report)) = outcome else {
            panic!("expected fatal missing dependency");
        };
        assert_eq!(report.package, "gettext");
        assert!(report.hint_install_flag);
        assert!(ctx.recorded().is_empty());
        assert_eq!(events, ["missing:gettext"]);
    }

    /// Different dependencies each get their own install.
    #[test]
    fn distinct_dependencies_install_in_turn() {
        let ctx = ScriptedContext::with_apt_get();
        let mut events = Vec::new();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op(vec![
                Err(OpFailure::message("autoconf: not found")),
                Err(OpFailure::message("missing fswatch")),
                Ok(()),
            ]),
            record_into(&mut events),
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Completed {
                value: (),
                install_attempts: 2
            }
        );
        let runs = ctx.recorded();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].command, "apt-get install -y autoconf");
        assert_eq!(runs[1].command, "apt-get install -y fswatch");
        assert_eq!(
            events,
            ["missing:autoconf", "retrying", "missing:fswatch", "retrying"]
        );
    }

    /// "Twice in a row" means consecutive: a dependency may come back later
    /// as long as a different one failed in between.
    #[test]
    fn alternating_dependencies_are_not_repeats() {
        let ctx = ScriptedContext::with_apt_get();

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op(vec![
                Err(OpFailure::message("autoconf: not found")),
                Err(OpFailure::message("missing fswatch")),
                Err(OpFailure::message("autoconf: not found")),
                Ok(()),
            ]),
            |_| {},
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Completed {
                value: (),
                install_attempts: 3
            }
        );
        assert_eq!(ctx.recorded().len(), 3);
    }

    /// Exit codes, signals, and timeouts each summarize differently.
    #[test]
    fn failure_from_output_summarizes_status() {
        let exited = output_with(2, "out", "err");
        let failure = OpFailure::from_output(&exited);
        assert_eq!(failure.summary, "exited with status 2");
        assert_eq!(failure.diagnostic, "outerr");

        let mut timed_out = output_with(0, "", "");
        timed_out.timed_out = true;
        assert_eq!(OpFailure::from_output(&timed_out).summary, "timed out");

        let mut signalled = output_with(0, "", "");
        signalled.status = exit_status_from_signal(9);
        assert_eq!(
            OpFailure::from_output(&signalled).summary,
            "terminated by signal"
        );
    }

    /// The classifier sees stdout and stderr together.
    #[test]
    fn diagnostic_spans_both_streams() {
        let ctx = ScriptedContext::with_apt_get();
        let mut output = output_with(127, "make: entering directory\n", "");
        output.stderr = b"/bin/sh: 1: autoconf: not found\n".to_vec();
        let failure = OpFailure::from_output(&output);

        let outcome = run_healed(
            &ctx,
            true,
            scripted_op(vec![Err(failure), Ok(())]),
            |_| {},
        )
        .expect("heal");

        assert_eq!(
            outcome,
            HealOutcome::Completed {
                value: (),
                install_attempts: 1
            }
        );
    }

    fn exit_status_from_signal(signal: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(signal)
    }

    /// `exit_status` builds a status whose code round-trips.
    #[test]
    fn scripted_exit_status_round_trips() {
        assert_eq!(exit_status(0).code(), Some(0));
        assert_eq!(exit_status(7).code(), Some(7));
        assert!(!exit_status(1).success());
    }
}
