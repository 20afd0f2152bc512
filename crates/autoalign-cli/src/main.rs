mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autoalign_core::{
    AlignedReport, AlignmentResult, Arena, Category, ExportFormat, OraclePhase, Session,
    SessionConfig, UploadRegistry, UploadedFile,
    config::{DEFAULT_MAX_ITERATIONS, DEFAULT_TICK_INTERVAL, DEFAULT_TOTAL_ROUNDS},
};
use autoalign_host::{DebateRuntime, Event};
use autoalign_oracle::{DEFAULT_ORACLE_URL, HttpOracle, Oracle};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconcile new requirements against a policy corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload documents, run the agent debate and print the aligned output
    Debate(DebateArgs),
    /// Render a saved alignment response without contacting the oracle
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
struct DebateArgs {
    /// Knowledge-base file (policy, regulation). Repeatable.
    #[arg(short, long)]
    knowledge: Vec<PathBuf>,

    /// New requirement file. Repeatable; the first one is analyzed.
    #[arg(short, long)]
    requirement: Vec<PathBuf>,

    /// Alignment endpoint
    #[arg(long, env = "AUTOALIGN_ORACLE_URL", default_value = DEFAULT_ORACLE_URL)]
    oracle_url: String,

    /// Give up on the oracle after this many seconds (default: wait indefinitely)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Iteration cap sent to the oracle
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    #[command(flatten)]
    output: OutputArgs,

    /// Turn-alternation period while the debate runs
    #[arg(
        long,
        default_value_t = DEFAULT_TICK_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    tick_ms: u64,
}

#[derive(clap::Args, Debug)]
struct InspectArgs {
    /// JSON body returned by the alignment endpoint
    path: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Round ceiling shown in the progress section
    #[arg(long, default_value_t = DEFAULT_TOTAL_ROUNDS)]
    total_rounds: u32,

    /// Write the aligned report to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export format
    #[arg(long, value_enum, default_value_t = Format::Md)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Md,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Md => ExportFormat::Markdown,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("autoalign v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Debate(args) => run_debate(args).await,
        Command::Inspect(args) => run_inspect(args),
    }
}

async fn run_debate(args: DebateArgs) -> Result<()> {
    let oracle: Arc<dyn Oracle> = match args.timeout_secs {
        Some(secs) => Arc::new(HttpOracle::with_timeout(
            &args.oracle_url,
            Duration::from_secs(secs),
        )?),
        None => Arc::new(HttpOracle::new(&args.oracle_url)),
    };
    let config = SessionConfig {
        total_rounds: args.output.total_rounds,
        max_iterations: args.max_iterations,
        tick_interval: Duration::from_millis(args.tick_ms),
        ..SessionConfig::default()
    };
    let mut runtime = DebateRuntime::new(oracle, config);

    // Stage 1: ingestion
    for (category, paths) in [
        (Category::Knowledge, &args.knowledge),
        (Category::Requirement, &args.requirement),
    ] {
        let files = paths
            .iter()
            .map(|p| UploadedFile::from_path(p).with_context(|| format!("opening {}", p.display())))
            .collect::<Result<Vec<_>>>()?;
        runtime.dispatch(Event::Upload { category, files })?;
    }
    display::print_uploads(runtime.uploads());

    // Stage 2: debate
    runtime.dispatch(Event::StartDebate)?;
    display::print_turn(&runtime.arena());
    let phase = runtime.run_until_settled(display::print_turn).await;
    eprintln!();
    display::print_arena(&runtime.arena());

    if phase != OraclePhase::Succeeded {
        let reason = runtime
            .session()
            .last_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("debate ended while {phase}"));
        anyhow::bail!("alignment failed: {reason}");
    }

    // Stage 3: output
    runtime.dispatch(Event::ViewResults)?;
    finish(runtime.session(), &args.output)
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let body = std::fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let result = AlignmentResult::parse(&body)
        .with_context(|| format!("parsing {}", args.path.display()))?;

    // Replay the response through the same transitions a live run takes.
    let mut uploads = UploadRegistry::new();
    uploads.add(Category::Knowledge, [UploadedFile::from_text("(saved)", "")]);
    uploads.add(Category::Requirement, [UploadedFile::from_text(file_label(&args.path), body)]);
    let mut session = Session::new();
    let token = session.start_debate(&uploads)?;
    session.oracle_succeeded(token, result)?;

    let config = SessionConfig {
        total_rounds: args.output.total_rounds,
        ..SessionConfig::default()
    };
    display::print_arena(&Arena::project(&session, &config, 0));

    session.view_results()?;
    finish(&session, &args.output)
}

fn finish(session: &Session, output: &OutputArgs) -> Result<()> {
    let report = AlignedReport::from_session(session, Utc::now())
        .context("no aligned result to report")?;
    display::print_report(&report);
    if let Some(path) = &output.export {
        export(&report, path, output.format.into())?;
    }
    Ok(())
}

fn export(report: &AlignedReport, path: &Path, format: ExportFormat) -> Result<()> {
    let text = report.render(format)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), format = format.extension(), "report exported");
    println!("Exported report to {}", path.display());
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
