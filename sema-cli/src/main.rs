//! sema CLI - GrFN extraction and semantic analysis for C programs
//!
//! Sends a C source file to the GrFN and expression-tree services, combines
//! their results and submits the combined document for semantic analysis.

use std::path::{Path, PathBuf};

use clap::Parser;
use sema_core::{PipelineError, PipelineInput};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::analyze::{self, AnalyzeArgs, ServiceOverrides};
use config::SemaConfig;
use output::{ErrorMessage, Output, OutputFormat};

/// Exit status for malformed invocations, matching clap's own usage errors.
const USAGE_EXIT_CODE: i32 = 2;

/// Semantic analysis of C programs through GrFN.
///
/// Accepts a `.c` file, a single `.json` artifact from an earlier run, or a
/// GrFN and expression-tree `.json` pair. Every intermediate result is saved
/// next to the input so a later run can resume from it.
#[derive(Parser)]
#[command(name = "sema")]
#[command(author, version)]
#[command(about = "GrFN extraction and semantic analysis for C programs")]
#[command(after_help = "Examples:
  sema -i foo.c                            Full run from source
  sema -i foo_combined.json                Semantic analysis only
  sema -i foo_GrFN.json -i foo_ExpTree.json   Combine and analyze
  sema -i foo.c --annotator                Translate to SADL with the annotator")]
pub struct Cli {
    /// Input file: one .c file, one .json file, or two .json files
    #[arg(short, long = "input", value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Base name for generated artifacts (defaults to the input's name)
    #[arg(short, long, value_name = "BASE")]
    output: Option<PathBuf>,

    /// Directory receiving the shared SemAnnotation.csv (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    shared_dir: Option<PathBuf>,

    /// Skip the query and annotated-model calls when the base model fails
    #[arg(long)]
    gate_on_base: bool,

    /// Send the combined document to the semantic annotator instead of semantic analysis
    #[arg(long)]
    annotator: bool,

    /// API key for the GrFN and expression-tree services
    #[arg(long, env = "SEMA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// GrFN translate endpoint
    #[arg(long, env = "SEMA_GRFN_URL", value_name = "URL")]
    grfn_url: Option<String>,

    /// Expression-tree extraction endpoint
    #[arg(long, env = "SEMA_EXPTREE_URL", value_name = "URL")]
    exptree_url: Option<String>,

    /// Base URL of the semantic-analysis service
    #[arg(long, env = "SEMA_SEMANTIC_URL", value_name = "URL")]
    semantic_url: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

const USAGE_HINT: &str = "Usage: sema -i <FILE.c|FILE.json> [-i <FILE.json>] [--shared-dir <DIR>]";

/// Print a usage error in the chosen format and exit.
fn usage_exit(error: &PipelineError, format: OutputFormat) -> ! {
    let message = ErrorMessage::with_details(error.to_string(), USAGE_HINT);
    eprintln!("{}", Output::new(message, format).render_to_string());
    std::process::exit(USAGE_EXIT_CODE);
}

/// Setup logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .semarc.toml
    let config = SemaConfig::load(Path::new("."));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    // Classification happens before any file is opened or request is sent.
    let input = match PipelineInput::from_paths(&cli.inputs) {
        Ok(input) => input,
        Err(e) if e.is_usage() => usage_exit(&e, format),
        Err(e) => return Err(e.into()),
    };

    let args = AnalyzeArgs {
        input,
        output: cli.output,
        shared_dir: cli.shared_dir,
        gate_on_base: cli.gate_on_base,
        annotator: cli.annotator,
        services: ServiceOverrides {
            api_key: cli.api_key,
            grfn_url: cli.grfn_url,
            exptree_url: cli.exptree_url,
            semantic_url: cli.semantic_url,
        },
    };

    match analyze::run(args, &config, format, cli.quiet).await {
        Err(e) => match e.downcast_ref::<PipelineError>() {
            Some(usage) if usage.is_usage() => usage_exit(usage, format),
            _ => Err(e),
        },
        ok => ok,
    }
}
