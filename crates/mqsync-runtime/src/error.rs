use std::fmt;

use mqsync_salesforce::{AuthError, StoreError};
use mqsync_slack::RetrievalError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Pipeline step a run-level error originated from.
pub enum PipelineStage {
    Authentication,
    Retrieval,
    QueueResolution,
    BatchSubmission,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Retrieval => "retrieval",
            Self::QueueResolution => "queue_resolution",
            Self::BatchSubmission => "batch_submission",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
/// Fatal errors that abort a run before it can report.
pub enum RunError {
    #[error("authentication failed: {0}")]
    Authentication(#[source] AuthError),
    #[error("chat history retrieval failed: {0}")]
    Retrieval(#[source] RetrievalError),
    #[error("queue lookup failed: {0}")]
    QueueLookup(#[source] StoreError),
    #[error("queue '{name}' not found")]
    QueueNotFound { name: String },
    #[error("queue lookup for '{name}' matched {matches} records")]
    AmbiguousQueue { name: String, matches: usize },
    #[error("batch submission failed after {submitted_records} records were already submitted: {source}")]
    BatchSubmission {
        submitted_records: usize,
        #[source]
        source: StoreError,
    },
    #[error("batch submission interrupted after {submitted_records} records were already submitted: {source}")]
    BatchInterrupted {
        submitted_records: usize,
        #[source]
        source: Box<RunError>,
    },
    #[error("run deadline exceeded during {stage}")]
    TimedOut { stage: PipelineStage },
    #[error("run cancelled during {stage}")]
    Cancelled { stage: PipelineStage },
}

impl RunError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Authentication(_) => PipelineStage::Authentication,
            Self::Retrieval(_) => PipelineStage::Retrieval,
            Self::QueueLookup(_) | Self::QueueNotFound { .. } | Self::AmbiguousQueue { .. } => {
                PipelineStage::QueueResolution
            }
            Self::BatchSubmission { .. } | Self::BatchInterrupted { .. } => {
                PipelineStage::BatchSubmission
            }
            Self::TimedOut { stage } | Self::Cancelled { stage } => *stage,
        }
    }

    /// Records earlier chunks committed before a batch-stage failure.
    pub fn submitted_records(&self) -> Option<usize> {
        match self {
            Self::BatchSubmission {
                submitted_records, ..
            }
            | Self::BatchInterrupted {
                submitted_records, ..
            } => Some(*submitted_records),
            _ => None,
        }
    }
}
