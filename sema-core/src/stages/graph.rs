//! GrFN extraction: C source in, graph envelope out.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::info;

use crate::artifact::{ArtifactKind, ArtifactStore};
use crate::client::{Endpoint, Payload, RemoteService, ResponseFormat};
use crate::documents::{GraphEnvelope, SourceDocument, GRFN_KEY};
use crate::error::{PipelineError, Result};

/// Language tag the GrFN service expects for C sources.
const SOURCE_LANGUAGE: &str = "c";

/// Output model requested from the GrFN service.
const OUTPUT_MODEL: &str = "GRFN";

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct GraphExtraction {
    /// Full service response, needed by the expression-tree service.
    pub envelope: GraphEnvelope,
    /// Where the unwrapped graph was written.
    pub graph_path: PathBuf,
}

/// Submits a source file to the GrFN translate endpoint.
pub struct GraphExtractionStage<'a, S: RemoteService + ?Sized> {
    service: &'a S,
    store: &'a ArtifactStore,
}

impl<'a, S: RemoteService + ?Sized> GraphExtractionStage<'a, S> {
    pub fn new(service: &'a S, store: &'a ArtifactStore) -> Self {
        Self { service, store }
    }

    /// Translate the source and persist `<base>_GrFN.json`.
    pub async fn run(&self, source: &SourceDocument) -> Result<GraphExtraction> {
        info!("Requesting GrFN for {}", source.file_name);
        let outcome = self
            .service
            .invoke(
                Endpoint::GraphTranslate,
                Payload::Json(translate_request(source)),
                ResponseFormat::Json,
            )
            .await;

        if !outcome.ok {
            return Err(outcome.into_error(Endpoint::GraphTranslate));
        }

        let envelope = outcome
            .into_json()
            .and_then(GraphEnvelope::from_value)
            .ok_or_else(|| PipelineError::RemoteCall {
                endpoint: Endpoint::GraphTranslate,
                reason: format!("response has no '{}' key", GRFN_KEY),
                body: String::new(),
            })?;

        let graph_path = self.store.write_json(ArtifactKind::Graph, envelope.graph())?;
        Ok(GraphExtraction {
            envelope,
            graph_path,
        })
    }
}

/// Build the translate request body for one source file.
pub fn translate_request(source: &SourceDocument) -> Value {
    json!({
        "source_code_files": [{
            "file_name": source.file_name,
            "file_type": SOURCE_LANGUAGE,
            "base64_encoding": STANDARD.encode(source.text.as_bytes()),
        }],
        "documentation_files": [],
        "source_language": SOURCE_LANGUAGE,
        "output_model": OUTPUT_MODEL,
    })
}
