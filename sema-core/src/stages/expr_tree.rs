//! Expression-tree extraction from a GrFN envelope.

use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use crate::artifact::{ArtifactKind, ArtifactStore};
use crate::client::{Endpoint, Payload, RemoteService, ResponseFormat};
use crate::documents::GraphEnvelope;
use crate::error::Result;

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExpressionTrees {
    pub document: Value,
    pub path: PathBuf,
}

/// Posts the graph envelope to the expression-tree endpoint.
pub struct ExpressionTreeStage<'a, S: RemoteService + ?Sized> {
    service: &'a S,
    store: &'a ArtifactStore,
}

impl<'a, S: RemoteService + ?Sized> ExpressionTreeStage<'a, S> {
    pub fn new(service: &'a S, store: &'a ArtifactStore) -> Self {
        Self { service, store }
    }

    /// Extract expression trees and persist `<base>_ExpTree.json`.
    ///
    /// The service takes the envelope, never the unwrapped graph.
    pub async fn run(&self, envelope: &GraphEnvelope) -> Result<ExpressionTrees> {
        info!("Requesting expression trees");
        let outcome = self
            .service
            .invoke(
                Endpoint::ExprTreeExtract,
                Payload::Json(envelope.as_value().clone()),
                ResponseFormat::Json,
            )
            .await;

        if !outcome.ok {
            return Err(outcome.into_error(Endpoint::ExprTreeExtract));
        }

        let document = outcome.into_json().unwrap_or(Value::Null);
        let path = self.store.write_json(ArtifactKind::ExprTrees, &document)?;
        Ok(ExpressionTrees { document, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::testing::FakeService;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sends_envelope() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());
        let service = FakeService::all_ok();
        let envelope = GraphEnvelope::wrap(json!({"functions": []}));

        let trees = ExpressionTreeStage::new(&service, &store)
            .run(&envelope)
            .await
            .unwrap();

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Endpoint::ExprTreeExtract);
        assert_eq!(calls[0].1, Payload::Json(json!({"grfn": {"functions": []}})));

        assert_eq!(trees.path, dir.path().join("foo_ExpTree.json"));
        assert_eq!(trees.document, json!([{"node": "x + 1"}]));
        assert_eq!(ArtifactStore::read_json(&trees.path).unwrap(), trees.document);
    }

    #[tokio::test]
    async fn test_failure_is_remote_call_error() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());
        let service = FakeService::new().fail(Endpoint::ExprTreeExtract, 500, "boom");

        let err = ExpressionTreeStage::new(&service, &store)
            .run(&GraphEnvelope::wrap(json!({})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::RemoteCall {
                endpoint: Endpoint::ExprTreeExtract,
                ..
            }
        ));
        assert!(!store.path(ArtifactKind::ExprTrees).exists());
    }
}
