//! changeset-approver: auto-approve no-op change sets in CodePipeline.
//!
//! Usage:
//!   changeset-approver                     # run as a Lambda function
//!   changeset-approver invoke -e ev.json   # handle one event locally
//!   changeset-approver parse -e ev.json    # show what an event asks for
//!
//! For more info: changeset-approver --help

use anyhow::{Context, Result};
use changeset_approver::config::{self, GateConfig};
use changeset_approver::notification;
use changeset_approver::pipeline::CodePipelineService;
use changeset_approver::{ApprovalGate, InvocationReport};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lambda_runtime::{service_fn, LambdaEvent};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Auto-approves a pipeline's manual approval when the change set it
/// guards was created with no changes.
#[derive(Parser)]
#[command(
    name = "changeset-approver",
    version,
    about = "Auto-approve CodePipeline approvals for empty change sets"
)]
struct Cli {
    /// YAML file with poll settings
    #[arg(long, global = true, env = "APPROVER_CONFIG")]
    config: Option<PathBuf>,

    /// Give up polling for execution data after this many seconds
    #[arg(long, global = true, env = "APPROVER_MAX_WAIT_SECONDS")]
    max_wait_seconds: Option<u64>,

    /// Seconds to wait between state fetches
    #[arg(long, global = true, env = "APPROVER_WAIT_INCREMENT_SECONDS")]
    wait_increment_seconds: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run under the Lambda runtime (the default)
    Serve,

    /// Handle a single event against the real pipeline API
    Invoke {
        /// Event JSON file (reads stdin if not given)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Parse an event and print the approval request, without calling AWS
    Parse {
        /// Event JSON file (reads stdin if not given)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `invoke`/`parse` output stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("changeset_approver=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        None | Some(Commands::Serve) => match load_config(&cli) {
            Ok(config) => run_serve(config).await,
            Err(e) => Err(e),
        },
        Some(Commands::Invoke { event }) => match load_config(&cli) {
            Ok(config) => run_invoke(config, event.as_deref()).await,
            Err(e) => Err(e),
        },
        Some(Commands::Parse { event }) => run_parse(event.as_deref()),
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}

/// Config file (if any), then env/flag overrides on top.
fn load_config(cli: &Cli) -> Result<GateConfig> {
    let base = match &cli.config {
        Some(path) => config::parse_config_file(path)?,
        None => GateConfig::default(),
    };
    let config = base.with_overrides(cli.max_wait_seconds, cli.wait_increment_seconds);
    config.validate().context("Invalid poll settings")?;
    Ok(config)
}

async fn run_serve(config: GateConfig) -> Result<()> {
    let service = Arc::new(CodePipelineService::from_env().await);
    let gate = Arc::new(ApprovalGate::new(service, config)?);

    tracing::info!(
        max_wait_s = gate.config().poll.max_wait.as_secs(),
        wait_increment_s = gate.config().poll.wait_increment.as_secs(),
        "Starting Lambda runtime"
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let gate = gate.clone();
        async move {
            let report = gate.handle(&event.payload).await;
            Ok::<InvocationReport, lambda_runtime::Error>(report)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
    .context("Lambda runtime stopped")
}

async fn run_invoke(config: GateConfig, event_path: Option<&Path>) -> Result<()> {
    let raw = read_event(event_path)?;
    let event: serde_json::Value = serde_json::from_str(&raw).context("Event is not valid JSON")?;

    let service = Arc::new(CodePipelineService::from_env().await);
    let gate = ApprovalGate::new(service, config)?;
    let report = gate.handle(&event).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_parse(event_path: Option<&Path>) -> Result<()> {
    let raw = read_event(event_path)?;
    let request = notification::parse_event_str(&raw)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn read_event(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            Ok(raw)
        }
    }
}
