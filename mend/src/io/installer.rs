//! Package installation for missing dependencies.
//!
//! Chooses apt or Homebrew by probing the target for `apt-get`, then either
//! runs the install (auto mode) or produces the manual instructions the
//! operator needs.

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::io::context::{CommandSpec, ExecutionContext};
use crate::ui;

/// How a missing dependency was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An install ran; the wrapped command should be retried.
    Attempted,
    /// No install will run; the operator has to act.
    GaveUp(MissingDepReport),
}

/// Manual-install instructions for a dependency mend will not install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDepReport {
    /// Package the failure text mapped to.
    pub package: String,
    /// Label of the target the dependency is missing on.
    pub target: String,
    /// Install command the operator can run themselves.
    pub manual_command: String,
    /// Suggest `--install-deps`; false when auto mode was already on.
    pub hint_install_flag: bool,
}

/// True when the target resolves `apt-get`.
///
/// A probe that itself fails counts as not having apt-get; Homebrew is the
/// fallback on every platform without it.
pub fn has_apt_get<C: ExecutionContext>(ctx: &C) -> bool {
    match ctx.locate_binary("apt-get") {
        Ok(Some(_)) => true,
        Ok(None) => false,
        Err(err) => {
            warn!(err = %err, "apt-get probe failed, assuming not present");
            false
        }
    }
}

/// Handle one missing dependency.
///
/// In auto mode a first-time dependency is installed through the platform
/// package manager and `Attempted` comes back. A repeat dependency, or any
/// dependency outside auto mode, comes back as `GaveUp` with the
/// instructions to show the operator.
///
/// The install's own exit status is not inspected: whether it worked shows
/// up when the wrapped command is retried, and a retry that fails on the
/// same dependency is the signal to stop.
#[instrument(skip_all, fields(package, is_repeat, auto_install))]
pub fn resolve_missing<C: ExecutionContext>(
    ctx: &C,
    package: &str,
    is_repeat: bool,
    auto_install: bool,
) -> Result<Resolution> {
    let apt = has_apt_get(ctx);

    if auto_install && !is_repeat {
        ui::install_banner(package);
        let output = if apt {
            // Attached to the terminal so sudo can prompt for a password.
            let spec = CommandSpec::new("apt-get").args(["install", "-y", package]);
            ui::echo_command(&format!("sudo {}", spec.render()));
            ctx.run_elevated_attached(&spec)
                .context("run apt-get install")?
        } else {
            let spec = CommandSpec::new("brew")
                .args(["install", package])
                .env("HOMEBREW_NO_EMOJI", "1");
            ui::echo_command(&spec.render());
            ctx.run_captured(&spec, None).context("run brew install")?
        };
        ui::quote_output(ctx.label(), &output);
        debug!(exit_code = ?output.status.code(), "install attempt finished");
        return Ok(Resolution::Attempted);
    }

    let manual_command = if apt {
        format!("sudo apt-get install {package}")
    } else {
        format!("brew install {package}")
    };
    Ok(Resolution::GaveUp(MissingDepReport {
        package: package.to_string(),
        target: ctx.label().to_string(),
        manual_command,
        hint_install_flag: !auto_install,
    }))
}
