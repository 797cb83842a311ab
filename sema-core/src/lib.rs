//! sema core - orchestration of the GrFN, expression-tree and semantic-analysis
//! services.
//!
//! A run takes a C source file (or artifacts from an earlier run), obtains a
//! GrFN graph and its expression trees, merges them into a combined document
//! and submits that document for semantic analysis. Every intermediate result
//! is persisted next to the input so a later run can resume from it.
//!
//! # Usage
//!
//! ```no_run
//! use sema_core::{HttpServiceClient, Pipeline, PipelineInput, PipelineOptions, ServiceConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> sema_core::Result<()> {
//! let input = PipelineInput::from_paths(&[PathBuf::from("foo.c")])?;
//! let client = HttpServiceClient::new(ServiceConfig::default());
//! let report = Pipeline::new(client, PipelineOptions::default()).run(&input).await;
//! println!("finished in state {}", report.final_state());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use artifact::{ArtifactKind, ArtifactStore, SHARED_QUERY_FILE};
pub use client::{Endpoint, HttpServiceClient, Outcome, Payload, RemoteService, ResponseBody, ResponseFormat};
pub use config::ServiceConfig;
pub use documents::{CombinedArtifact, CombinedDocument, GraphEnvelope, InputArtifact};
pub use error::{PipelineError, Result};
pub use input::{InputKind, PipelineInput};
pub use pipeline::{Pipeline, PipelineOptions};
pub use report::{PipelineEvent, PipelineState, RunReport};
pub use stages::{CallRecord, CallStatus, SemanticCall};
