//! Joins a graph and its expression trees into the combined document.

use serde_json::Value;
use tracing::info;

use crate::artifact::ArtifactStore;
use crate::documents::{CombinedArtifact, CombinedDocument};
use crate::error::Result;

/// Builds and persists `<base>_combined.json`.
pub struct ArtifactCombiner<'a> {
    store: &'a ArtifactStore,
}

impl<'a> ArtifactCombiner<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    /// Merge and persist. A null graph or expression-tree document is a
    /// `PrerequisiteMissing` error and nothing is written.
    pub fn combine(&self, graph: Value, expr_trees: Value) -> Result<CombinedArtifact> {
        let doc = CombinedDocument::new(graph, expr_trees)?;
        let artifact = self.store.write_combined(&doc)?;
        info!("Combined document written to {}", artifact.path.display());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::documents::EXPTREE_KEY;
    use crate::error::PipelineError;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_combine_writes_both_keys() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());

        let artifact = ArtifactCombiner::new(&store)
            .combine(json!({"functions": []}), json!([1]))
            .unwrap();

        let value = ArtifactStore::read_json(&artifact.path).unwrap();
        assert_eq!(value, json!({"grfn": {"functions": []}, "expTreeArray": [1]}));
    }

    #[test]
    fn test_null_expr_trees_is_prerequisite_missing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());

        let err = ArtifactCombiner::new(&store)
            .combine(json!({"functions": []}), Value::Null)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::PrerequisiteMissing { field: EXPTREE_KEY }
        ));
        assert!(!store.path(ArtifactKind::Combined).exists());
    }
}
