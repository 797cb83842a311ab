//! Semantic analysis: base model, query, annotated model, or the annotator.
//!
//! Every call posts the same in-memory combined artifact. A failed call is
//! recorded and the next one is still attempted, unless gating on the base
//! model was requested.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{ArtifactKind, ArtifactStore};
use crate::client::{Endpoint, Payload, RemoteService, ResponseFormat};
use crate::documents::CombinedArtifact;
use crate::error::Result;

/// Calls made against a combined artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCall {
    BaseModel,
    Query,
    AnnotatedModel,
    /// Single-shot SADL translation by the semantic annotator.
    Annotator,
}

impl SemanticCall {
    /// Semantic analysis, in the order the calls are made.
    pub const ALL: [SemanticCall; 3] = [
        SemanticCall::BaseModel,
        SemanticCall::Query,
        SemanticCall::AnnotatedModel,
    ];

    /// Annotator mode.
    pub const ANNOTATOR: [SemanticCall; 1] = [SemanticCall::Annotator];

    pub fn endpoint(self) -> Endpoint {
        match self {
            SemanticCall::BaseModel => Endpoint::SemanticBaseModel,
            SemanticCall::Query => Endpoint::SemanticQuery,
            SemanticCall::AnnotatedModel => Endpoint::SemanticAnnotatedModel,
            SemanticCall::Annotator => Endpoint::SemanticAnnotator,
        }
    }
}

/// What happened to one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallStatus {
    /// Succeeded; the response was written to these files.
    Saved { paths: Vec<PathBuf> },
    /// The service returned a failure, or its response could not be saved.
    Failed { reason: String, body: String },
    /// Not attempted because the base model failed and gating was on.
    Skipped,
}

impl CallStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, CallStatus::Saved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub call: SemanticCall,
    #[serde(flatten)]
    pub status: CallStatus,
}

/// Runs the semantic-analysis calls against a combined artifact.
pub struct SemanticAnalysisStage<'a, S: RemoteService + ?Sized> {
    service: &'a S,
    store: &'a ArtifactStore,
}

impl<'a, S: RemoteService + ?Sized> SemanticAnalysisStage<'a, S> {
    pub fn new(service: &'a S, store: &'a ArtifactStore) -> Self {
        Self { service, store }
    }

    /// Make the given calls in order, reporting each record as it completes.
    ///
    /// With `gate_on_base`, the calls after the base model are skipped when
    /// the base model fails.
    pub async fn run<F>(
        &self,
        artifact: &CombinedArtifact,
        calls: &[SemanticCall],
        gate_on_base: bool,
        mut on_record: F,
    ) -> Vec<CallRecord>
    where
        F: FnMut(&CallRecord),
    {
        let mut records = Vec::with_capacity(calls.len());
        let mut base_failed = false;

        for &call in calls {
            let status = if gate_on_base && base_failed {
                CallStatus::Skipped
            } else {
                self.call(call, artifact).await
            };
            if call == SemanticCall::BaseModel {
                base_failed = !status.is_saved();
            }

            let record = CallRecord { call, status };
            on_record(&record);
            records.push(record);
        }

        records
    }

    /// Make one call and persist its result on success.
    ///
    /// A service failure or a failed write is `CallStatus::Failed`; either
    /// way the next call still runs.
    pub async fn call(&self, call: SemanticCall, artifact: &CombinedArtifact) -> CallStatus {
        let endpoint = call.endpoint();
        let payload = Payload::File {
            file_name: artifact.file_name(),
            bytes: artifact.bytes.clone(),
        };
        let outcome = self
            .service
            .invoke(endpoint, payload, ResponseFormat::Text)
            .await;

        if !outcome.ok {
            warn!("{} service failed: {}", endpoint, outcome.reason);
            return CallStatus::Failed {
                reason: outcome.reason,
                body: outcome.body.into_text(),
            };
        }

        match self.save(call, &outcome.body.into_text()) {
            Ok(paths) => {
                info!("{} saved to {} file(s)", endpoint, paths.len());
                CallStatus::Saved { paths }
            }
            Err(e) => {
                warn!("{} response could not be saved: {}", endpoint, e);
                CallStatus::Failed {
                    reason: e.to_string(),
                    body: String::new(),
                }
            }
        }
    }

    fn save(&self, call: SemanticCall, text: &str) -> Result<Vec<PathBuf>> {
        let paths = match call {
            SemanticCall::BaseModel => vec![self.store.write_text(ArtifactKind::BaseModel, text)?],
            SemanticCall::Query => {
                let csv = self.store.write_text(ArtifactKind::QueryResult, text)?;
                let shared = self.store.write_shared_query(text)?;
                vec![csv, shared]
            }
            SemanticCall::AnnotatedModel => {
                vec![self.store.write_text(ArtifactKind::AnnotatedModel, text)?]
            }
            SemanticCall::Annotator => vec![self.store.write_text(ArtifactKind::Annotation, text)?],
        };
        Ok(paths)
    }
}
