//! In-memory shapes of the documents threaded through the pipeline.
//!
//! Payload contents are never inspected beyond the two top-level keys that
//! distinguish a graph envelope from a combined document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

/// Key holding the graph document in envelopes and combined documents.
pub const GRFN_KEY: &str = "grfn";

/// Key holding the expression-tree document in a combined document.
pub const EXPTREE_KEY: &str = "expTreeArray";

/// Raw text of a C translation unit, read once at the start of a run.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Label sent to the GrFN service alongside the source.
    pub file_name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(Self {
            file_name: path.to_string_lossy().into_owned(),
            text,
        })
    }
}

/// The GrFN service response: an object whose `grfn` key holds the graph.
///
/// The expression-tree service consumes the whole envelope, not just the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEnvelope(Value);

impl GraphEnvelope {
    /// Accept `value` as an envelope if it carries a `grfn` key.
    pub fn from_value(value: Value) -> Option<Self> {
        match &value {
            Value::Object(map) if map.contains_key(GRFN_KEY) => Some(Self(value)),
            _ => None,
        }
    }

    /// Wrap an unwrapped graph document.
    pub fn wrap(graph: Value) -> Self {
        let mut map = Map::new();
        map.insert(GRFN_KEY.to_string(), graph);
        Self(Value::Object(map))
    }

    pub fn graph(&self) -> &Value {
        &self.0[GRFN_KEY]
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_graph(self) -> Value {
        match self.0 {
            Value::Object(mut map) => map.remove(GRFN_KEY).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

/// Graph and expression trees joined under the two fixed keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedDocument {
    #[serde(rename = "grfn")]
    graph: Value,
    #[serde(rename = "expTreeArray")]
    expr_trees: Value,
}

impl CombinedDocument {
    /// Join the two documents. Neither may be null.
    pub fn new(graph: Value, expr_trees: Value) -> Result<Self> {
        if graph.is_null() {
            return Err(PipelineError::PrerequisiteMissing { field: GRFN_KEY });
        }
        if expr_trees.is_null() {
            return Err(PipelineError::PrerequisiteMissing { field: EXPTREE_KEY });
        }
        Ok(Self { graph, expr_trees })
    }

    pub fn graph(&self) -> &Value {
        &self.graph
    }

    pub fn expr_trees(&self) -> &Value {
        &self.expr_trees
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// What a pre-supplied JSON file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum InputArtifact {
    /// A graph document with no envelope.
    RawGraph(Value),
    /// A GrFN service response with a `grfn` key.
    GraphEnvelope(GraphEnvelope),
    /// Already combined; goes straight to semantic analysis.
    Combined(CombinedDocument),
}

impl InputArtifact {
    /// Classify a loaded JSON document by its top-level keys.
    ///
    /// A document carrying both keys must have both populated. `null`, a
    /// `grfn` key holding `null`, and a lone `expTreeArray` carry no graph
    /// and are rejected here, before any remote call.
    pub fn classify(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut map)
                if map.contains_key(GRFN_KEY) && map.contains_key(EXPTREE_KEY) =>
            {
                let graph = map.remove(GRFN_KEY).unwrap_or(Value::Null);
                let trees = map.remove(EXPTREE_KEY).unwrap_or(Value::Null);
                Ok(InputArtifact::Combined(CombinedDocument::new(graph, trees)?))
            }
            Value::Object(map) if map.contains_key(GRFN_KEY) => match map.get(GRFN_KEY) {
                Some(Value::Null) => Err(PipelineError::PrerequisiteMissing { field: GRFN_KEY }),
                _ => Ok(InputArtifact::GraphEnvelope(GraphEnvelope(Value::Object(map)))),
            },
            Value::Object(map) if map.contains_key(EXPTREE_KEY) => {
                Err(PipelineError::PrerequisiteMissing { field: GRFN_KEY })
            }
            Value::Null => Err(PipelineError::PrerequisiteMissing { field: GRFN_KEY }),
            other => Ok(InputArtifact::RawGraph(other)),
        }
    }

    /// The graph document, whatever the wrapping.
    pub fn into_graph(self) -> Value {
        match self {
            InputArtifact::RawGraph(graph) => graph,
            InputArtifact::GraphEnvelope(envelope) => envelope.into_graph(),
            InputArtifact::Combined(doc) => doc.graph,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InputArtifact::RawGraph(_) => "graph",
            InputArtifact::GraphEnvelope(_) => "graph envelope",
            InputArtifact::Combined(_) => "combined document",
        }
    }
}

/// A combined document as persisted on disk, held in memory for upload.
///
/// Every semantic-analysis call posts these same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl CombinedArtifact {
    /// Name used for the multipart upload.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "combined.json".to_string())
    }
}
