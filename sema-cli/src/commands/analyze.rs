//! Analyze command - run an input through the GrFN and semantic-analysis services

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use sema_core::{
    CallRecord, CallStatus, HttpServiceClient, Pipeline, PipelineEvent, PipelineInput,
    PipelineOptions, PipelineState, RunReport, ServiceConfig,
};

use crate::config::SemaConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// Service settings given on the command line or through `SEMA_*` variables.
#[derive(Debug, Clone, Default)]
pub struct ServiceOverrides {
    pub api_key: Option<String>,
    pub grfn_url: Option<String>,
    pub exptree_url: Option<String>,
    pub semantic_url: Option<String>,
}

impl ServiceOverrides {
    /// Layer the overrides on top of the configured services.
    pub fn apply(self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(key) = self.api_key {
            config.api_key = Some(key);
        }
        if let Some(url) = self.grfn_url {
            config.grfn_url = url;
        }
        if let Some(url) = self.exptree_url {
            config.exptree_url = url;
        }
        if let Some(url) = self.semantic_url {
            config.semantic_url = url;
        }
        config
    }
}

pub struct AnalyzeArgs {
    pub input: PipelineInput,
    pub output: Option<PathBuf>,
    pub shared_dir: Option<PathBuf>,
    pub gate_on_base: bool,
    pub annotator: bool,
    pub services: ServiceOverrides,
}

/// Run the pipeline and render its report.
///
/// Remote failures are part of the report, not an error: the command only
/// fails when the working directory cannot be resolved or the options are
/// unusable. The latter surfaces as a usage `PipelineError` before any
/// request is sent.
pub async fn run(args: AnalyzeArgs, config: &SemaConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    let services = args.services.apply(config.services.clone());
    let shared_dir = match args.shared_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let options = PipelineOptions {
        output_base: args.output,
        shared_dir,
        gate_on_base: args.gate_on_base,
        annotator: args.annotator,
    };
    options.validate()?;

    let mut pipeline = Pipeline::new(HttpServiceClient::new(services), options);
    // Progress lines would corrupt JSON on stdout.
    if format == OutputFormat::Table && !quiet {
        pipeline = pipeline.with_observer(print_progress);
    }

    let report = pipeline.run(&args.input).await;

    if quiet && format == OutputFormat::Table {
        return Ok(());
    }
    Output::new(report, format).render()
}

fn print_progress(event: &PipelineEvent) {
    if let Some(line) = progress_line(event) {
        println!("{}", line);
    }
}

/// Human-readable line for a progress event, if it warrants one.
fn progress_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::StateChanged(_) => None,
        PipelineEvent::ServiceResponded {
            endpoint,
            ok,
            reason,
        } => {
            let reason = if *ok { reason.green() } else { reason.red() };
            Some(format!("{} service response: {}", endpoint, reason))
        }
        PipelineEvent::ArtifactWritten(path) => Some(format!("saving {}", path.display())),
        PipelineEvent::CallCompleted(record) => Some(call_line(record)),
        PipelineEvent::Aborted { reason } => Some(format!("{} {}", "Aborted:".red().bold(), reason)),
    }
}

fn call_line(record: &CallRecord) -> String {
    let endpoint = record.call.endpoint();
    match &record.status {
        CallStatus::Saved { paths } => {
            let names: Vec<String> = paths
                .iter()
                .map(PathBuf::as_path)
                .map(display_name)
                .collect();
            format!(
                "{} service response: {}\nsaving {}",
                endpoint,
                "OK".green(),
                names.join(" and ")
            )
        }
        CallStatus::Failed { reason, body } => {
            let mut line = format!("{} service returned: {}", endpoint, reason.red());
            if !body.is_empty() {
                line.push('\n');
                line.push_str(body);
            }
            line
        }
        CallStatus::Skipped => format!(
            "{} {}",
            endpoint,
            "skipped: base model was not generated".yellow()
        ),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn status_cell(status: &CallStatus) -> (String, String) {
    match status {
        CallStatus::Saved { paths } => (
            "saved".to_string(),
            paths
                .iter()
                .map(PathBuf::as_path)
                .map(display_name)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        CallStatus::Failed { reason, .. } => ("failed".to_string(), reason.clone()),
        CallStatus::Skipped => ("skipped".to_string(), String::new()),
    }
}

impl TableDisplay for RunReport {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        let heading = if self.succeeded() {
            "Analysis complete".green().bold()
        } else if self.is_aborted() {
            "Run aborted".red().bold()
        } else if self.final_state() == PipelineState::AnalysisComplete {
            "Analysis complete with failures".yellow().bold()
        } else {
            "Run incomplete".yellow().bold()
        };
        lines.push(format!("{}", heading));

        let inputs: Vec<String> = self
            .input
            .paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        lines.push(format!("  {}: {}", "Input".cyan(), inputs.join(", ")));
        lines.push(format!("  {}: {}", "Base".cyan(), self.base.display()));
        lines.push(format!(
            "  {}: {}",
            "Started".cyan(),
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let trail: Vec<String> = self.states.iter().map(|s| s.to_string()).collect();
        lines.push(format!("  {}: {}", "States".cyan(), trail.join(" -> ")));

        if let Some(reason) = &self.abort_reason {
            lines.push(format!("  {}: {}", "Reason".red(), reason));
        }

        if !self.artifacts.is_empty() {
            lines.push(format!("  {}:", "Artifacts".cyan()));
            for path in &self.artifacts {
                lines.push(format!("    {}", path.display()));
            }
        }

        if !self.semantic.is_empty() {
            let rows = self
                .semantic
                .iter()
                .map(|record| {
                    let (status, detail) = status_cell(&record.status);
                    vec![record.call.endpoint().to_string(), status, detail]
                })
                .collect();
            lines.push(String::new());
            lines.push(TableOutput::format_rows(&["Call", "Status", "Detail"], rows));
        }

        lines.push(format!(
            "\n{}",
            format!("({} ms)", self.duration_ms).dimmed()
        ));

        lines.join("\n")
    }
}
