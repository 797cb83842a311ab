//! Run states, progress events and the final run report.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::Endpoint;
use crate::input::PipelineInput;
use crate::stages::{CallRecord, CallStatus};

/// States of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    InputClassified,
    GraphProduced,
    GraphLoaded,
    ExprTreeProduced,
    ExprTreeLoaded,
    Combined,
    AnalysisComplete,
    Aborted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::InputClassified => "input classified",
            PipelineState::GraphProduced => "graph produced",
            PipelineState::GraphLoaded => "graph loaded",
            PipelineState::ExprTreeProduced => "expression trees produced",
            PipelineState::ExprTreeLoaded => "expression trees loaded",
            PipelineState::Combined => "combined",
            PipelineState::AnalysisComplete => "analysis complete",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    /// The GrFN or expression-tree service answered.
    ServiceResponded {
        endpoint: Endpoint,
        ok: bool,
        reason: String,
    },
    ArtifactWritten(PathBuf),
    /// One semantic-analysis call finished (or was skipped).
    CallCompleted(CallRecord),
    Aborted {
        reason: String,
    },
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub input: PipelineInput,
    pub base: PathBuf,
    /// Every state entered, in order.
    pub states: Vec<PipelineState>,
    /// Every file written, in order.
    pub artifacts: Vec<PathBuf>,
    pub semantic: Vec<CallRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(input: PipelineInput, base: &Path) -> Self {
        Self {
            started_at: Utc::now(),
            input,
            base: base.to_path_buf(),
            states: Vec::new(),
            artifacts: Vec::new(),
            semantic: Vec::new(),
            abort_reason: None,
            duration_ms: 0,
        }
    }

    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Start)
    }

    pub fn is_aborted(&self) -> bool {
        self.final_state() == PipelineState::Aborted
    }

    /// Whether the given state was entered during the run.
    pub fn visited(&self, state: PipelineState) -> bool {
        self.states.contains(&state)
    }

    /// Analysis completed and every semantic call saved its output.
    pub fn succeeded(&self) -> bool {
        self.final_state() == PipelineState::AnalysisComplete
            && !self.semantic.is_empty()
            && self.semantic.iter().all(|r| r.status.is_saved())
    }

    pub fn failed_calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.semantic
            .iter()
            .filter(|r| matches!(r.status, CallStatus::Failed { .. }))
    }

    pub(crate) fn record_call(&mut self, record: &CallRecord) {
        if let CallStatus::Saved { paths } = &record.status {
            self.artifacts.extend(paths.iter().cloned());
        }
        self.semantic.push(record.clone());
    }
}
