//! Pipeline stages.
//!
//! Each stage wraps one concern: a remote call (or three, for semantic
//! analysis) plus the artifact it persists. Stages never decide whether a
//! failure ends the run; the orchestrator does.

pub mod combine;
pub mod expr_tree;
pub mod graph;
pub mod semantic;

pub use combine::ArtifactCombiner;
pub use expr_tree::{ExpressionTreeStage, ExpressionTrees};
pub use graph::{GraphExtraction, GraphExtractionStage};
pub use semantic::{CallRecord, CallStatus, SemanticAnalysisStage, SemanticCall};
