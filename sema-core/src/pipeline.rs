//! Pipeline orchestration.
//!
//! Drives a classified input through the stages it still needs:
//!
//! - `.c` source: GrFN extraction, expression trees, combine, analysis
//! - graph or envelope JSON: expression trees, combine, analysis
//! - combined JSON: analysis only, posting the input file unchanged
//! - graph + expression-tree pair: combine, analysis
//!
//! Failures before a combined document exists abort the run. Failures of
//! individual semantic calls are recorded and the run continues. In
//! annotator mode the combined document goes to the semantic annotator
//! instead of the three analysis calls.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifact::ArtifactStore;
use crate::client::{Endpoint, RemoteService};
use crate::documents::{CombinedArtifact, GraphEnvelope, InputArtifact, SourceDocument};
use crate::error::{PipelineError, Result};
use crate::input::PipelineInput;
use crate::report::{PipelineEvent, PipelineState, RunReport};
use crate::stages::{
    ArtifactCombiner, ExpressionTreeStage, GraphExtractionStage, SemanticAnalysisStage,
    SemanticCall,
};

/// Callback receiving progress events.
pub type Observer = Box<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Knobs that change where artifacts land and how analysis is gated.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Overrides the base name derived from the input file.
    pub output_base: Option<PathBuf>,
    /// Directory receiving the shared `SemAnnotation.csv`.
    pub shared_dir: PathBuf,
    /// Skip query and annotated-model calls when the base model fails.
    pub gate_on_base: bool,
    /// Translate with the semantic annotator instead of running semantic analysis.
    pub annotator: bool,
}

impl PipelineOptions {
    /// Reject options that would fail only after remote work was done.
    ///
    /// An empty `shared_dir` means the working directory.
    pub fn validate(&self) -> Result<()> {
        let dir = &self.shared_dir;
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(PipelineError::Usage {
                message: format!("shared directory '{}' does not exist", dir.display()),
            });
        }
        Ok(())
    }

    /// Calls made once the combined document exists.
    pub fn calls(&self) -> &'static [SemanticCall] {
        if self.annotator {
            &SemanticCall::ANNOTATOR
        } else {
            &SemanticCall::ALL
        }
    }
}

/// Runs inputs through the stages against one remote service.
pub struct Pipeline<S> {
    service: S,
    options: PipelineOptions,
    observer: Option<Observer>,
}

impl<S: RemoteService> Pipeline<S> {
    pub fn new(service: S, options: PipelineOptions) -> Self {
        Self {
            service,
            options,
            observer: None,
        }
    }

    /// Builder: receive progress events.
    pub fn with_observer(mut self, observer: impl Fn(&PipelineEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Artifact store for an input, honoring the base-name override.
    pub fn store_for(&self, input: &PipelineInput) -> ArtifactStore {
        let base = self
            .options
            .output_base
            .clone()
            .unwrap_or_else(|| input.base_name());
        ArtifactStore::new(base, &self.options.shared_dir)
    }

    /// Run the pipeline to completion. Never fails: errors end up in the
    /// report as an `Aborted` state with a reason.
    pub async fn run(&self, input: &PipelineInput) -> RunReport {
        let started = Instant::now();
        let store = self.store_for(input);
        let mut run = Run {
            pipeline: self,
            store: &store,
            report: RunReport::new(input.clone(), store.base()),
        };

        run.transition(PipelineState::Start);
        run.transition(PipelineState::InputClassified);

        match run.execute(input).await {
            Ok(()) => run.transition(PipelineState::AnalysisComplete),
            Err(e) => run.abort(e),
        }

        let mut report = run.report;
        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Run finished in state '{}' ({} artifacts)",
            report.final_state(),
            report.artifacts.len()
        );
        report
    }

    fn emit(&self, event: &PipelineEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

/// State of one run in progress.
struct Run<'p, S> {
    pipeline: &'p Pipeline<S>,
    store: &'p ArtifactStore,
    report: RunReport,
}

impl<'p, S: RemoteService> Run<'p, S> {
    async fn execute(&mut self, input: &PipelineInput) -> Result<()> {
        self.pipeline.options.validate()?;

        let artifact = match input {
            PipelineInput::Source { path } => self.from_source(path).await?,
            PipelineInput::Artifact { path } => self.from_artifact(path).await?,
            PipelineInput::Pair { graph, expr_trees } => self.from_pair(graph, expr_trees)?,
        };
        self.transition(PipelineState::Combined);

        let pipeline = self.pipeline;
        let report = &mut self.report;
        let options = &pipeline.options;
        SemanticAnalysisStage::new(&pipeline.service, self.store)
            .run(&artifact, options.calls(), options.gate_on_base, |record| {
                pipeline.emit(&PipelineEvent::CallCompleted(record.clone()));
                report.record_call(record);
            })
            .await;

        Ok(())
    }

    async fn from_source(&mut self, path: &Path) -> Result<CombinedArtifact> {
        let source = SourceDocument::read(path)?;
        let pipeline = self.pipeline;

        let result = GraphExtractionStage::new(&pipeline.service, self.store)
            .run(&source)
            .await;
        let extraction = self.responded(Endpoint::GraphTranslate, result)?;
        self.written(extraction.graph_path.clone());
        self.transition(PipelineState::GraphProduced);

        self.extract_and_combine(extraction.envelope).await
    }

    async fn from_artifact(&mut self, path: &Path) -> Result<CombinedArtifact> {
        let bytes = ArtifactStore::read_bytes(path)?;
        let value = ArtifactStore::parse_json(path, &bytes)?;
        let artifact = InputArtifact::classify(value)?;
        debug!("{} classified as {}", path.display(), artifact.kind());

        match artifact {
            InputArtifact::Combined(_) => {
                info!("{} is already combined; skipping extraction", path.display());
                self.transition(PipelineState::GraphLoaded);
                self.transition(PipelineState::ExprTreeLoaded);
                Ok(CombinedArtifact {
                    path: path.to_path_buf(),
                    bytes,
                })
            }
            InputArtifact::GraphEnvelope(envelope) => {
                self.transition(PipelineState::GraphLoaded);
                self.extract_and_combine(envelope).await
            }
            InputArtifact::RawGraph(graph) => {
                self.transition(PipelineState::GraphLoaded);
                self.extract_and_combine(GraphEnvelope::wrap(graph)).await
            }
        }
    }

    fn from_pair(&mut self, graph_path: &Path, trees_path: &Path) -> Result<CombinedArtifact> {
        let graph = InputArtifact::classify(ArtifactStore::read_json(graph_path)?)?.into_graph();
        self.transition(PipelineState::GraphLoaded);

        let trees = ArtifactStore::read_json(trees_path)?;
        self.transition(PipelineState::ExprTreeLoaded);

        self.combine(graph, trees)
    }

    async fn extract_and_combine(&mut self, envelope: GraphEnvelope) -> Result<CombinedArtifact> {
        let pipeline = self.pipeline;
        let result = ExpressionTreeStage::new(&pipeline.service, self.store)
            .run(&envelope)
            .await;
        let trees = self.responded(Endpoint::ExprTreeExtract, result)?;
        self.written(trees.path.clone());
        self.transition(PipelineState::ExprTreeProduced);

        self.combine(envelope.into_graph(), trees.document)
    }

    fn combine(&mut self, graph: Value, trees: Value) -> Result<CombinedArtifact> {
        let artifact = ArtifactCombiner::new(self.store).combine(graph, trees)?;
        self.written(artifact.path.clone());
        Ok(artifact)
    }

    /// Report a GrFN or expression-tree service response.
    fn responded<T>(&mut self, endpoint: Endpoint, result: Result<T>) -> Result<T> {
        let response = match &result {
            Ok(_) => Some((true, "OK".to_string())),
            Err(PipelineError::RemoteCall { reason, .. }) => Some((false, reason.clone())),
            Err(_) => None,
        };
        if let Some((ok, reason)) = response {
            self.pipeline.emit(&PipelineEvent::ServiceResponded {
                endpoint,
                ok,
                reason,
            });
        }
        result
    }

    fn written(&mut self, path: PathBuf) {
        self.pipeline.emit(&PipelineEvent::ArtifactWritten(path.clone()));
        self.report.artifacts.push(path);
    }

    fn transition(&mut self, state: PipelineState) {
        debug!("State -> {}", state);
        self.report.states.push(state);
        self.pipeline.emit(&PipelineEvent::StateChanged(state));
    }

    fn abort(&mut self, error: PipelineError) {
        let reason = error.to_string();
        warn!("Run aborted: {}", reason);
        self.report.abort_reason = Some(reason.clone());
        self.transition(PipelineState::Aborted);
        self.pipeline.emit(&PipelineEvent::Aborted { reason });
    }
}
