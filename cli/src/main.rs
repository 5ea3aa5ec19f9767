//! CLI for the scan runner.
//!
//! Dispatches license scans to a CI workflow, finds the run the dispatch
//! created, watches it to completion and lists or downloads its artifacts.

use clap::{Args, Parser, Subcommand, ValueEnum};
use scan_runner::{
    resolve, ArchiveFormat, ArtifactReport, CancellationToken, CorrelationOutcome, DispatchToken,
    RunSource, Runner, RunnerError, ScanConfig, ScanSummary, ScanTarget, TargetError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Scan Runner - Dispatch license scans to a CI workflow and track them.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the scan runner config file.
    #[arg(long, global = true, env = "SCAN_RUNNER_CONFIG", default_value = "scan-runner.toml")]
    config: PathBuf,

    /// GitHub Personal Access Token.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a repository URL and show the ref that would be scanned.
    Resolve {
        /// Repository URL, optionally with /tree/<ref>, /commit/<sha> or /releases/tag/<tag>.
        url: String,

        /// Ref to scan; overrides any ref in the URL.
        #[arg(long = "ref", default_value = "")]
        git_ref: String,
    },

    /// List branches and tags of a repository.
    Refs {
        /// Repository URL.
        url: String,
    },

    /// Dispatch a scan and follow it to completion.
    Scan(ScanArgs),

    /// Watch an existing run until it completes.
    Watch {
        /// Run ID.
        run_id: u64,
    },

    /// List the artifacts of a run.
    Artifacts {
        /// Run ID.
        run_id: u64,

        /// Download available artifacts into this directory.
        #[arg(long)]
        download: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Token embedded in the run title; generated when omitted.
    #[arg(long)]
    run_tag: Option<String>,

    #[command(subcommand)]
    target: TargetCommand,
}

#[derive(Subcommand, Debug)]
enum TargetCommand {
    /// Scan a container image.
    Docker {
        /// Image reference, e.g. alpine:latest.
        image: String,
    },

    /// Scan a repository at a ref.
    Git {
        /// Repository URL.
        url: String,

        /// Ref to scan; overrides any ref in the URL.
        #[arg(long = "ref", default_value = "")]
        git_ref: String,
    },

    /// Scan a downloadable source archive.
    Archive {
        /// Archive URL.
        url: String,

        /// Archive format; inferred from the URL when omitted.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Zip,
    Tar,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Zip => Self::Zip,
            FormatArg::Tar => Self::Tar,
        }
    }
}

/// Errors that end the CLI with exit code 2.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Config(#[from] scan_runner::ConfigError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    GitHub(#[from] scan_runner::RunSourceError),

    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    #[error(transparent)]
    Download(#[from] scan_runner::DownloadError),

    #[error("A GitHub token is required (--token or GITHUB_TOKEN)")]
    MissingToken,

    #[error("Not a repository URL: {0}")]
    NotARepository(String),
}

/// Whether the command achieved what it was asked to.
enum Outcome {
    Success,
    Incomplete,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            on_interrupt.cancel();
        }
    });

    match run(cli, &cancel).await {
        Ok(Outcome::Success) => ExitCode::from(0),
        Ok(Outcome::Incomplete) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Compact single-line output; `RUST_LOG` sets the level (defaults to "info").
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(cli: Cli, cancel: &CancellationToken) -> Result<Outcome, CliError> {
    match cli.command {
        Command::Resolve { url, git_ref } => {
            let reference = resolve(&url, &git_ref);
            println!("Clone URL: {}", reference.canonical_url);
            println!("Ref:       {}", reference.resolved_ref);
            if let Some(full_name) = reference.full_name() {
                println!("Repository: {full_name}");
            }
            if reference.ref_detected_from_url() {
                println!("(ref taken from the URL)");
            }
            if let Err(message) = reference.validate_ref() {
                warn!(reference = %reference.resolved_ref, %message, "Ref is not a valid ref name");
                return Ok(Outcome::Incomplete);
            }
            Ok(if reference.is_parsed() {
                Outcome::Success
            } else {
                Outcome::Incomplete
            })
        }
        Command::Refs { url } => {
            let reference = resolve(&url, "");
            let (Some(owner), Some(name)) = (&reference.owner, &reference.name) else {
                return Err(CliError::NotARepository(url));
            };
            let runner = build_runner(&cli.config, cli.token)?;
            let catalog = runner.client().list_refs(owner, name).await?;
            for choice in catalog.choices() {
                println!("{choice}");
            }
            Ok(Outcome::Success)
        }
        Command::Scan(args) => {
            let runner = build_runner(&cli.config, cli.token)?;
            let target = match args.target {
                TargetCommand::Docker { image } => ScanTarget::docker(&image)?,
                TargetCommand::Git { url, git_ref } => {
                    ScanTarget::git(&url, &git_ref, &runner.config().allowed_hosts)?
                }
                TargetCommand::Archive { url, format } => {
                    ScanTarget::archive(&url, format.map(ArchiveFormat::from))?
                }
            };
            let token = args
                .run_tag
                .as_deref()
                .map_or_else(DispatchToken::generate, DispatchToken::from_input);

            let summary = runner.scan(&target, token, cancel).await?;
            print_summary(&summary);
            Ok(if summary.succeeded() {
                Outcome::Success
            } else {
                Outcome::Incomplete
            })
        }
        Command::Watch { run_id } => {
            let runner = build_runner(&cli.config, cli.token)?;
            let last = runner.watch(run_id, cancel).await;
            match &last {
                Some(run) => println!(
                    "Run {}: {} ({})",
                    run.id,
                    run.status.as_str(),
                    run.conclusion.map_or("-", |c| c.as_str())
                ),
                None => println!("Run {run_id}: no snapshot"),
            }
            Ok(if last.as_ref().is_some_and(|run| run.succeeded()) {
                Outcome::Success
            } else {
                Outcome::Incomplete
            })
        }
        Command::Artifacts { run_id, download } => {
            let runner = build_runner(&cli.config, cli.token)?;
            let artifacts = runner.client().list_artifacts(run_id).await?;
            let report = ArtifactReport::from_artifacts(run_id, artifacts);
            print_artifacts(&report);

            if let Some(dir) = download {
                for artifact in &report.available {
                    let path = runner.client().download_artifact(artifact, &dir).await?;
                    info!(name = %artifact.name, path = %path.display(), "Downloaded artifact");
                }
            }
            Ok(if report.available.is_empty() {
                Outcome::Incomplete
            } else {
                Outcome::Success
            })
        }
    }
}

fn build_runner(config: &std::path::Path, token: Option<String>) -> Result<Runner, CliError> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or(CliError::MissingToken)?;
    let config = ScanConfig::load(config)?;
    Ok(Runner::new(config, token)?)
}

/// Prints the final scan summary.
fn print_summary(summary: &ScanSummary) {
    println!("\nSummary:");
    println!(
        "  Scan type: {}",
        summary
            .dispatch
            .inputs
            .get("scan_type")
            .map_or("-", String::as_str)
    );
    println!("  Run tag: {}", summary.dispatch.token);
    println!("  Input tag: {}", summary.input_tag);
    println!(
        "  Correlation: {} after {} listing(s)",
        summary.correlation.outcome.as_str(),
        summary.correlation.attempts
    );

    match &summary.correlation.outcome {
        CorrelationOutcome::Found(run) | CorrelationOutcome::BestGuess(run) => {
            println!("  Run: {}", run.html_url);
            if summary.is_best_guess() {
                println!("  Note: the run was matched by time only and may belong to another dispatch");
            }
        }
        CorrelationOutcome::NotFound | CorrelationOutcome::Cancelled => {
            println!("  Run: not located, see {}", summary.actions_url);
        }
    }

    if let Some(run) = &summary.last_snapshot {
        println!(
            "  Status: {} ({})",
            run.status.as_str(),
            run.conclusion.map_or("-", |c| c.as_str())
        );
    }
    if !summary.completed() && summary.run().is_some() {
        println!("  Outcome unknown: the run did not complete while watching");
    }
    if let Some(report) = &summary.artifacts {
        print_artifacts(report);
    }
}

fn print_artifacts(report: &ArtifactReport) {
    println!("  Artifacts: {}", report.available.len());
    for artifact in &report.available {
        println!("    {} ({} bytes)", artifact.name, artifact.size_bytes);
    }
    for artifact in &report.expired {
        println!("    {} (expired)", artifact.name);
    }
}
