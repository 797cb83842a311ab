//! Error types for sema-core.

use std::path::PathBuf;
use thiserror::Error;

use crate::client::Endpoint;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can stop (part of) a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed invocation, detected before any I/O.
    #[error("Usage error: {message}")]
    Usage {
        /// What was wrong with the invocation.
        message: String,
    },

    /// Input file has neither a source nor a JSON extension.
    #[error("Unsupported input file '{path}': expected a .c or .json file")]
    InputType {
        /// Offending input path.
        path: PathBuf,
    },

    /// A remote service call returned a non-success outcome.
    #[error("{endpoint} service failed: {reason}")]
    RemoteCall {
        /// Service that was called.
        endpoint: Endpoint,
        /// Status reason or transport error.
        reason: String,
        /// Response body returned by the service, if any.
        body: String,
    },

    /// A stage was invoked without an artifact it requires.
    #[error("Missing prerequisite: {field} is absent or null")]
    PrerequisiteMissing {
        /// Name of the missing field or artifact.
        field: &'static str,
    },

    /// An input document did not have the expected shape.
    #[error("Invalid input document {path}: {message}")]
    InvalidInput {
        /// Document that was loaded.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// IO error reading or writing an artifact.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Errors that are reported before any network call or file write.
    pub fn is_usage(&self) -> bool {
        matches!(self, PipelineError::Usage { .. } | PipelineError::InputType { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
