// crates/piflow-cli/src/main.rs
// ============================================================================
// Module: piflow CLI Entry Point
// Description: Command dispatcher for checking and activating rule configs.
// Purpose: Drive the lifecycle from a piflow.toml against an in-memory gateway.
// Dependencies: clap, piflow-config, piflow-core, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! `piflow check` assembles every configured rule and prints one JSON summary
//! line per rule without contacting a gateway. `piflow activate` registers
//! each referenced device as reachable and mastered on an in-memory gateway,
//! starts the application, prints the submission receipt, and stops it.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use piflow_config::PiflowConfig;
use piflow_core::AppConfig;
use piflow_core::AuditSink;
use piflow_core::DeviceId;
use piflow_core::DeviceStatus;
use piflow_core::InMemoryRuleGateway;
use piflow_core::RuleApp;
use piflow_core::RuleSummary;
use piflow_core::SubmissionReceipt;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "piflow", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble configured rules and print their summaries.
    Check(ConfigArgs),
    /// Submit configured rules to an in-memory gateway.
    Activate(ConfigArgs),
}

/// Shared config selection arguments.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to piflow.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => command_check(&args),
        Commands::Activate(args) => command_activate(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the check command.
fn command_check(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_app_config(args)?;
    for line in rule_lines(&config)? {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the activate command.
fn command_activate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = PiflowConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let audit = config.audit_sink().map_err(|err| CliError::new(err.to_string()))?;
    let app_config =
        config.app_config().map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let receipt = activate(&app_config, audit)?;
    let json = serde_json::to_string(&receipt)
        .map_err(|err| CliError::new(format!("failed to encode receipt: {err}")))?;
    write_stdout_line(&json).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads the config and resolves its pipeline schema.
fn load_app_config(args: &ConfigArgs) -> CliResult<AppConfig> {
    PiflowConfig::load(args.config.as_deref())
        .and_then(|config| config.app_config())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Assembles every rule and renders one JSON summary per rule.
fn rule_lines(config: &AppConfig) -> CliResult<Vec<String>> {
    config
        .rules
        .iter()
        .enumerate()
        .map(|(index, definition)| {
            let rule = definition
                .assemble(&config.schema, &config.app_id)
                .map_err(|err| CliError::new(format!("rule {index} failed to build: {err}")))?;
            serde_json::to_string(&RuleSummary::of(&rule))
                .map_err(|err| CliError::new(format!("failed to encode rule {index}: {err}")))
        })
        .collect()
}

/// Runs one start/stop cycle against an in-memory gateway.
///
/// Every device named by a definition is registered as reachable and
/// mastered. Unparseable device URIs are left for `start` to report.
fn activate<A: AuditSink>(config: &AppConfig, audit: A) -> CliResult<SubmissionReceipt> {
    let gateway = InMemoryRuleGateway::new().with_schema(config.schema.clone());
    for definition in &config.rules {
        if let Ok(device) = DeviceId::parse(&definition.device) {
            gateway
                .set_device(device, DeviceStatus::mastered())
                .map_err(|err| CliError::new(err.to_string()))?;
        }
    }
    let app = RuleApp::new(gateway, audit);
    let handle = app
        .start(config)
        .map_err(|err| CliError::new(format!("activation failed: {err}")))?;
    let receipt = handle.receipt().clone();
    app.stop(handle);
    Ok(receipt)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
