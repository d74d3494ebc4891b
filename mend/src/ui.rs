//! Operator-facing terminal output.
//!
//! Notices, echoes, and quoted install output all go to stderr so the
//! wrapped command's stdout stays clean for passthrough. Dim marks progress
//! and command echoes, red marks failure notices, bold marks the flag the
//! operator should reach for next.

use console::Style;

use crate::io::process::RunOutput;

/// Announce an automatic install before it starts.
pub fn install_banner(package: &str) {
    eprintln!(
        "{}{}{}",
        dim().apply_to("Attempting to automatically install missing dependency "),
        package,
        dim().apply_to("...")
    );
}

/// Echo a command the way a shell prompt would show it.
pub fn echo_command(command: &str) {
    eprintln!("{}{}", dim().apply_to("$ "), command);
}

/// Replay captured output, each line tagged with the target it came from.
pub fn quote_output(label: &str, output: &RunOutput) {
    let tag = format!("[{label}]");
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        eprintln!("{} {}", dim().apply_to(tag.as_str()), line);
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        eprintln!("{} {}", dim().apply_to(tag.as_str()), line);
    }
    let notices = format!(
        "{}{}",
        output.stdout_truncated_notice(label),
        output.stderr_truncated_notice(label)
    );
    if !notices.is_empty() {
        eprint!("{}", dim().apply_to(notices.as_str()));
    }
}

/// The wrapped command failed with a recognized missing dependency.
pub fn missing_dep_notice(package: &str) {
    eprintln!(
        "{}{}{}",
        error().apply_to("failed (missing "),
        package,
        error().apply_to(").")
    );
}

/// The wrapped command failed with no recognized dependency in its output.
pub fn unrecognized_notice(summary: &str) {
    eprintln!("{}", error().apply_to(format!("failed ({summary}).")));
}

/// Dump a failure's captured output verbatim.
pub fn dump_diagnostic(diagnostic: &str) {
    let trimmed = diagnostic.trim_end();
    if trimmed.is_empty() {
        return;
    }
    eprintln!("{trimmed}");
    eprintln!();
}

/// Announce the retry after an install attempt.
pub fn retrying() {
    eprintln!("{}", dim().apply_to("Retrying..."));
}

/// Final report when a missing dependency could not be resolved.
pub fn give_up_report(package: &str, target: &str, manual_command: &str, hint_install_flag: bool) {
    eprintln!();
    eprintln!(
        "{}{}{}{}{}",
        error().apply_to("You seem to be missing a required dependency, "),
        package,
        error().apply_to(", on "),
        target,
        error().apply_to(".")
    );
    eprintln!(
        "{}",
        dim().apply_to("To install just this dependency, you could try running this:")
    );
    eprintln!("{}{}", dim().apply_to("$ "), manual_command);
    if hint_install_flag {
        eprintln!();
        eprintln!(
            "{}{}{}",
            dim().apply_to(
                "Or if you'd prefer, I'll try to automatically install dependencies as needed with the "
            ),
            Style::new().for_stderr().bold().apply_to("--install-deps"),
            dim().apply_to(" flag.")
        );
    }
}

/// What `mend probe` prints about the target.
pub fn probe_report(target: &str, apt_get_path: Option<&str>) {
    println!("{} {}", Style::new().bold().apply_to("target:"), target);
    match apt_get_path {
        Some(path) => {
            println!(
                "{} apt-get ({path})",
                Style::new().bold().apply_to("package manager:")
            );
            println!(
                "{} sudo apt-get install -y <package>",
                Style::new().bold().apply_to("install command:")
            );
        }
        None => {
            println!(
                "{} homebrew (apt-get not found)",
                Style::new().bold().apply_to("package manager:")
            );
            println!(
                "{} brew install <package>",
                Style::new().bold().apply_to("install command:")
            );
        }
    }
}

fn dim() -> Style {
    Style::new().for_stderr().dim()
}

fn error() -> Style {
    Style::new().for_stderr().red()
}
