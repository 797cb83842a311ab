//! Artifact persistence.
//!
//! Every artifact lives next to the run's base name (`<base><suffix>`), except
//! the shared query result, which is always `SemAnnotation.csv` in the shared
//! directory. Nothing here ever deletes a file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::documents::{CombinedArtifact, CombinedDocument};
use crate::error::{PipelineError, Result};

/// Fixed file name read by the external visualization tool.
///
/// Overwritten by every successful query call; concurrent runs in one
/// directory race on it.
pub const SHARED_QUERY_FILE: &str = "SemAnnotation.csv";

/// Artifacts a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Graph,
    ExprTrees,
    Combined,
    BaseModel,
    QueryResult,
    AnnotatedModel,
    /// Output of the semantic annotator.
    Annotation,
}

impl ArtifactKind {
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Graph => "_GrFN.json",
            ArtifactKind::ExprTrees => "_ExpTree.json",
            ArtifactKind::Combined => "_combined.json",
            ArtifactKind::BaseModel => "_Base.sadl",
            ArtifactKind::QueryResult => ".csv",
            ArtifactKind::AnnotatedModel => "_SemAnalysis.sadl",
            ArtifactKind::Annotation => ".sadl",
        }
    }
}

/// Reads and writes the artifacts of one run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base: PathBuf,
    shared_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base: impl Into<PathBuf>, shared_dir: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            shared_dir: shared_dir.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Path of an artifact for this run.
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(kind.suffix());
        PathBuf::from(name)
    }

    pub fn shared_query_path(&self) -> PathBuf {
        self.shared_dir.join(SHARED_QUERY_FILE)
    }

    /// Write a JSON document, compact, as the services produced it.
    pub fn write_json(&self, kind: ArtifactKind, value: &Value) -> Result<PathBuf> {
        let bytes = serde_json::to_vec(value)?;
        self.write_bytes(self.path(kind), &bytes)
    }

    /// Write text verbatim.
    pub fn write_text(&self, kind: ArtifactKind, text: &str) -> Result<PathBuf> {
        self.write_bytes(self.path(kind), text.as_bytes())
    }

    /// Overwrite the shared query result.
    pub fn write_shared_query(&self, text: &str) -> Result<PathBuf> {
        self.write_bytes(self.shared_query_path(), text.as_bytes())
    }

    /// Persist a freshly combined document and keep its bytes for upload.
    pub fn write_combined(&self, doc: &CombinedDocument) -> Result<CombinedArtifact> {
        let bytes = doc.to_bytes()?;
        let path = self.write_bytes(self.path(ArtifactKind::Combined), &bytes)?;
        Ok(CombinedArtifact { path, bytes })
    }

    /// Read a JSON document from disk.
    pub fn read_json(path: &Path) -> Result<Value> {
        let bytes = Self::read_bytes(path)?;
        Self::parse_json(path, &bytes)
    }

    /// Parse bytes already read from `path`.
    pub fn parse_json(path: &Path, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(|e| PipelineError::InvalidInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| PipelineError::io(path, e))
    }

    fn write_bytes(&self, path: PathBuf, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::write(&path, bytes).map_err(|e| PipelineError::io(&path, e))?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_paths() {
        let store = ArtifactStore::new("work/foo", "shared");
        assert_eq!(store.path(ArtifactKind::Graph), PathBuf::from("work/foo_GrFN.json"));
        assert_eq!(store.path(ArtifactKind::ExprTrees), PathBuf::from("work/foo_ExpTree.json"));
        assert_eq!(store.path(ArtifactKind::Combined), PathBuf::from("work/foo_combined.json"));
        assert_eq!(store.path(ArtifactKind::BaseModel), PathBuf::from("work/foo_Base.sadl"));
        assert_eq!(store.path(ArtifactKind::QueryResult), PathBuf::from("work/foo.csv"));
        assert_eq!(
            store.path(ArtifactKind::AnnotatedModel),
            PathBuf::from("work/foo_SemAnalysis.sadl")
        );
        assert_eq!(store.path(ArtifactKind::Annotation), PathBuf::from("work/foo.sadl"));
        assert_eq!(store.shared_query_path(), PathBuf::from("shared/SemAnnotation.csv"));
    }

    #[test]
    fn test_write_and_read_json() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());

        let path = store.write_json(ArtifactKind::Graph, &json!({"grfn": 1})).unwrap();
        assert_eq!(path, dir.path().join("foo_GrFN.json"));
        assert_eq!(ArtifactStore::read_json(&path).unwrap(), json!({"grfn": 1}));
    }

    #[test]
    fn test_write_combined_keeps_bytes() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("foo"), dir.path());
        let doc = CombinedDocument::new(json!({"id": 1}), json!([])).unwrap();

        let artifact = store.write_combined(&doc).unwrap();
        assert_eq!(artifact.path, dir.path().join("foo_combined.json"));
        assert_eq!(std::fs::read(&artifact.path).unwrap(), artifact.bytes);
        assert_eq!(artifact.file_name(), "foo_combined.json");
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ArtifactStore::read_json(&path).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = ArtifactStore::read_json(Path::new("/nonexistent/foo.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
