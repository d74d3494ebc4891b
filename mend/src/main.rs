//! Self-healing command executor CLI.
//!
//! Wraps a command, watches failures for known missing-dependency
//! signatures, installs what is missing, and retries. The wrapped command's
//! own output and exit status pass through; mend's notices stay on stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use mend::core::rules::DEPENDENCY_RULES;
use mend::exit_codes;
use mend::heal::{FatalReport, HealEvent, HealOutcome, OpFailure, run_healed};
use mend::io::config::{DEFAULT_CONFIG_FILE, load_config};
use mend::io::context::{CommandSpec, ExecutionContext, LocalHost};
use mend::io::process::RunOutput;
use mend::logging;
use mend::ui;

#[derive(Parser)]
#[command(
    name = "mend",
    version,
    about = "Run a command, install what it is missing, and retry"
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a command, healing missing dependencies between attempts.
    Run(RunArgs),
    /// Report which package manager installs would use on this host.
    Probe,
    /// List the failure fragments mend recognizes.
    Rules {
        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Install missing dependencies automatically instead of stopping.
    #[arg(long)]
    install_deps: bool,

    /// Abort each attempt after this many seconds (0 = no limit).
    #[arg(long)]
    timeout: Option<u64>,

    /// Working directory for the command.
    #[arg(short = 'C', long)]
    workdir: Option<PathBuf>,

    /// The command and its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cmd_run(&cli.config, args),
        Command::Probe => cmd_probe(&cli.config),
        Command::Rules { json } => cmd_rules(json),
    }
}

fn cmd_run(config_path: &Path, args: RunArgs) -> Result<i32> {
    let mut config = load_config(config_path)?;
    if args.install_deps {
        config.auto_install_deps = true;
    }
    if let Some(secs) = args.timeout {
        config.command_timeout_secs = secs;
    }

    let host = LocalHost::with_output_limit(config.output_limit_bytes);
    let spec = command_spec(&args)?;
    let timeout = config.command_timeout();

    let outcome = run_healed(
        &host,
        config.auto_install_deps,
        || attempt(&host, &spec, timeout),
        render_event,
    )?;

    match outcome {
        HealOutcome::Completed {
            value: output,
            install_attempts,
        } => {
            debug!(install_attempts, "wrapped command completed");
            std::io::stdout()
                .write_all(&output.stdout)
                .context("write stdout")?;
            std::io::stderr()
                .write_all(&output.stderr)
                .context("write stderr")?;
            Ok(exit_codes::OK)
        }
        HealOutcome::Fatal(FatalReport::Unrecognized { .. }) => Ok(exit_codes::FAILED),
        HealOutcome::Fatal(FatalReport::MissingDependency(report)) => {
            ui::give_up_report(
                &report.package,
                &report.target,
                &report.manual_command,
                report.hint_install_flag,
            );
            Ok(exit_codes::UNRESOLVED)
        }
    }
}

/// One attempt of the wrapped command as the heal loop sees it.
fn attempt(
    host: &LocalHost,
    spec: &CommandSpec,
    timeout: Option<Duration>,
) -> Result<RunOutput, OpFailure> {
    match host.run_captured(spec, timeout) {
        Ok(output) if output.status.success() => Ok(output),
        Ok(output) => Err(OpFailure::from_output(&output)),
        Err(err) => Err(OpFailure::message(format!("{err:#}"))),
    }
}

fn command_spec(args: &RunArgs) -> Result<CommandSpec> {
    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("missing command to run"))?;
    let mut spec = CommandSpec::new(program).args(rest.iter().cloned());
    if let Some(dir) = &args.workdir {
        spec = spec.workdir(dir);
    }
    Ok(spec)
}

fn render_event(event: HealEvent<'_>) {
    match event {
        HealEvent::MissingDependency { package, failure } => {
            ui::missing_dep_notice(package);
            ui::dump_diagnostic(&failure.diagnostic);
        }
        HealEvent::Unrecognized { failure } => {
            ui::unrecognized_notice(&failure.summary);
            ui::dump_diagnostic(&failure.diagnostic);
        }
        HealEvent::Retrying => ui::retrying(),
    }
}

fn cmd_probe(config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let host = LocalHost::with_output_limit(config.output_limit_bytes);
    let apt_get = host.locate_binary("apt-get")?;
    ui::probe_report(host.label(), apt_get.as_deref());
    Ok(exit_codes::OK)
}

fn cmd_rules(json: bool) -> Result<i32> {
    if json {
        let payload =
            serde_json::to_string_pretty(DEPENDENCY_RULES).context("serialize rules")?;
        println!("{payload}");
        return Ok(exit_codes::OK);
    }
    let width = DEPENDENCY_RULES
        .iter()
        .map(|rule| rule.fragment.len())
        .max()
        .unwrap_or(0);
    for rule in DEPENDENCY_RULES {
        println!("{:width$}  {}", rule.fragment, rule.package);
    }
    Ok(exit_codes::OK)
}
