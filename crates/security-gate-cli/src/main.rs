// crates/security-gate-cli/src/main.rs
// ============================================================================
// Module: Security Gate CLI Entry Point
// Description: Command dispatcher for the server and offline validation.
// Purpose: Run the HTTP gate or push local artifacts through the same gate.
// Dependencies: clap, security-gate-core, security-gate-server, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `security-gate` binary starts the HTTP server, validates local
//! artifacts through the same audited gate lifecycle, reads the audit log, and
//! checks configuration files. The local operator is trusted: offline
//! validation skips bearer authentication but is still audited.
//! Security posture: input files are untrusted and read with a hard size cap.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use security_gate_config::SecurityGateConfig;
use security_gate_core::ArtifactFetcher;
use security_gate_core::AuditLog;
use security_gate_core::AuditQuery;
use security_gate_core::Decision;
use security_gate_core::FetchError;
use security_gate_core::FileAuditLog;
use security_gate_core::GateRequest;
use security_gate_core::GateResponse;
use security_gate_core::ObjectLocation;
use security_gate_core::ReferenceMetadata;
use security_gate_core::Scenario;
use security_gate_core::SecurityGate;
use security_gate_server::ObjectStoreFetcher;
use security_gate_server::SecurityGateServer;
use security_gate_server::StderrDecisionSink;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code reported when the gate blocks.
const BLOCK_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "security-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Security Gate HTTP server.
    Serve(ServeCommand),
    /// Validate local artifacts through the audited gate.
    Validate {
        /// Selected validation subcommand.
        #[command(subcommand)]
        command: ValidateCommand,
    },
    /// Print audit log records as JSON lines.
    Audit(AuditCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to security-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config and audit log selection shared by offline commands.
#[derive(Args, Debug, Clone)]
struct GateArgs {
    /// Optional config file path (defaults to security-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Audit log path overriding `audit.path` from config.
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
}

/// Validation subcommands.
#[derive(Subcommand, Debug)]
enum ValidateCommand {
    /// Validate a migration manifest and app config (scenario T1).
    Migration(MigrationArgs),
    /// Validate a replication manifest and local snapshot (scenario T2).
    Replication(ReplicationArgs),
    /// Validate a replication manifest referencing object storage (scenario T2).
    ReplicationRef(ReplicationRefArgs),
}

/// Arguments for `validate migration`.
#[derive(Args, Debug)]
struct MigrationArgs {
    /// Migration manifest JSON file.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Application config YAML file.
    #[arg(long, value_name = "PATH")]
    app_config: PathBuf,
    /// Config and audit log selection.
    #[command(flatten)]
    gate: GateArgs,
}

/// Arguments for `validate replication`.
#[derive(Args, Debug)]
struct ReplicationArgs {
    /// Replication manifest YAML file.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Snapshot file.
    #[arg(long, value_name = "PATH")]
    snapshot: PathBuf,
    /// Config and audit log selection.
    #[command(flatten)]
    gate: GateArgs,
}

/// Arguments for `validate replication-ref`.
#[derive(Args, Debug)]
struct ReplicationRefArgs {
    /// Reference manifest YAML file.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Config and audit log selection.
    #[command(flatten)]
    gate: GateArgs,
}

/// Arguments for `audit`.
#[derive(Args, Debug)]
struct AuditCommand {
    /// Maximum records printed.
    #[arg(long, default_value_t = AuditQuery::DEFAULT_LIMIT)]
    limit: usize,
    /// Only records with this decision (`ALLOW` or `BLOCK`).
    #[arg(long, value_parser = parse_decision)]
    decision: Option<Decision>,
    /// Only records with this scenario (`T1` or `T2`).
    #[arg(long, value_parser = parse_scenario)]
    scenario: Option<Scenario>,
    /// Config and audit log selection.
    #[command(flatten)]
    gate: GateArgs,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to security-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Validate {
            command,
        } => {
            tokio::task::spawn_blocking(move || command_validate(command))
                .await
                .map_err(|err| CliError::new(format!("validation join failed: {err}")))?
        }
        Commands::Audit(command) => command_audit(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let server = tokio::task::spawn_blocking(move || SecurityGateServer::from_config(&config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("security-gate listening on {}", server.addr()))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Validate Commands
// ============================================================================

/// Fetcher for commands that never dereference object-storage URIs.
struct DisabledFetcher;

impl ArtifactFetcher for DisabledFetcher {
    fn fetch(&self, _location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        Err(FetchError("artifact fetching is disabled for this command".to_string()))
    }
}

/// Executes a validation subcommand and maps the decision to an exit code.
fn command_validate(command: ValidateCommand) -> CliResult<ExitCode> {
    let response = match command {
        ValidateCommand::Migration(args) => {
            let config = load_config(args.gate.config.as_deref())?;
            let max_bytes = config.server.max_body_bytes;
            let manifest = read_input(&args.manifest, max_bytes)?;
            let app_config = read_input(&args.app_config, max_bytes)?;
            let gate = build_gate(&config, &args.gate, Arc::new(DisabledFetcher));
            let refs = vec![file_label(&args.manifest), file_label(&args.app_config)];
            let request =
                cli_request(Scenario::Migration, "validate migration").with_artifact_refs(refs);
            gate.check_migration(&request, || Ok(()), &manifest, &app_config)
        }
        ValidateCommand::Replication(args) => {
            let config = load_config(args.gate.config.as_deref())?;
            let max_bytes = config.server.max_body_bytes;
            let manifest = read_input(&args.manifest, max_bytes)?;
            let snapshot = read_input(&args.snapshot, max_bytes)?;
            let gate = build_gate(&config, &args.gate, Arc::new(DisabledFetcher));
            let refs = vec![file_label(&args.manifest), file_label(&args.snapshot)];
            let request =
                cli_request(Scenario::Replication, "validate replication").with_artifact_refs(refs);
            gate.check_replication(&request, || Ok(()), &manifest, &snapshot)
        }
        ValidateCommand::ReplicationRef(args) => {
            let config = load_config(args.gate.config.as_deref())?;
            let manifest = read_input(&args.manifest, config.server.max_body_bytes)?;
            let fetcher = ObjectStoreFetcher::from_config(&config.object_store)
                .map_err(|err| CliError::new(format!("object store init failed: {err}")))?;
            let gate = build_gate(&config, &args.gate, Arc::new(fetcher));
            let metadata = ReferenceMetadata::extract(&manifest);
            let request = cli_request(Scenario::Replication, "validate replication-ref")
                .with_artifact_refs(metadata.artifact_refs)
                .with_policy_version(metadata.policy_version);
            gate.check_replication_reference(&request, || Ok(()), &manifest)
        }
    };
    let rendered = serde_json::to_string_pretty(&response.result)
        .map_err(|err| CliError::new(format!("failed to render decision: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(exit_code_for(&response))
}

/// Builds a gate over the configured (or overridden) audit log.
fn build_gate(
    config: &SecurityGateConfig,
    args: &GateArgs,
    fetcher: Arc<dyn ArtifactFetcher>,
) -> SecurityGate {
    SecurityGate::new(Arc::new(audit_log(config, args)), fetcher, Arc::new(StderrDecisionSink))
}

/// Builds request metadata for an offline command.
fn cli_request(scenario: Scenario, command: &str) -> GateRequest {
    let client = format!("security-gate-cli/{}", env!("CARGO_PKG_VERSION"));
    GateRequest::new(Uuid::new_v4().to_string(), scenario, format!("cli:{command}"))
        .with_client(Some(client))
}

/// Maps a gate response to the process exit code.
fn exit_code_for(response: &GateResponse) -> ExitCode {
    if response.is_allowed() { ExitCode::SUCCESS } else { ExitCode::from(BLOCK_EXIT_CODE) }
}

// ============================================================================
// SECTION: Audit Command
// ============================================================================

/// Executes the `audit` command.
fn command_audit(command: &AuditCommand) -> CliResult<ExitCode> {
    let config = load_config(command.gate.config.as_deref())?;
    let query = AuditQuery {
        limit: command.limit,
        decision: command.decision,
        scenario: command.scenario,
    };
    let records = audit_log(&config, &command.gate)
        .read(&query)
        .map_err(|err| CliError::new(format!("audit log unavailable: {err}")))?;
    for record in records {
        let line = serde_json::to_string(&record)
            .map_err(|err| CliError::new(format!("failed to render audit record: {err}")))?;
        write_stdout_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Parses a decision filter value.
fn parse_decision(value: &str) -> Result<Decision, String> {
    Decision::parse(value).ok_or_else(|| "decision must be ALLOW or BLOCK".to_string())
}

/// Parses a scenario filter value.
fn parse_scenario(value: &str) -> Result<Scenario, String> {
    Scenario::parse(value).ok_or_else(|| "scenario must be T1 or T2".to_string())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            load_config(command.config.as_deref())?;
            write_stdout_line("config ok")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<SecurityGateConfig> {
    SecurityGateConfig::load(path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Returns the audit log selected by `--audit-log` or config.
fn audit_log(config: &SecurityGateConfig, args: &GateArgs) -> FileAuditLog {
    args.audit_log.as_ref().map_or_else(
        || FileAuditLog::new(config.audit.path.trim()),
        |path| FileAuditLog::new(path.clone()),
    )
}

/// Returns the file name of `path` for audit references.
fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Errors returned by bounded file reads.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// File I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// File size exceeds the configured limit.
    #[error("file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads a command input file.
fn read_input(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    read_bytes_with_limit(path, max_bytes)
        .map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stderr: {err}")))
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
