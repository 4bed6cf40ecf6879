//! Explicit run configuration resolved once at startup.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mqsync_core::{RecordTemplate, DEFAULT_PAYLOAD_MARKER, DEFAULT_QUEUE_NAME};

/// Collection inserts accept at most this many records per request.
pub const MAX_COLLECTION_RECORDS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// How to treat a queue lookup that matches more than one record.
pub enum AmbiguousQueuePolicy {
    #[default]
    UseFirst,
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// How to treat a message whose text carries the marker more than once.
pub enum RepeatedMarkerPolicy {
    #[default]
    Forward,
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Whether normalized payloads must parse as JSON before submission.
pub enum PayloadCheckPolicy {
    #[default]
    Forward,
    RequireJson,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelinePolicies {
    pub ambiguous_queue: AmbiguousQueuePolicy,
    pub repeated_marker: RepeatedMarkerPolicy,
    pub payload_check: PayloadCheckPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `PipelineConfig` consumed by the coordinator.
pub struct PipelineConfig {
    pub channel_id: String,
    pub window: HistoryWindow,
    pub marker: String,
    pub queue_name: String,
    pub record_template: RecordTemplate,
    pub max_batch_records: usize,
    pub policies: PipelinePolicies,
    pub run_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn new(channel_id: impl Into<String>, window: HistoryWindow) -> Self {
        Self {
            channel_id: channel_id.into(),
            window,
            marker: DEFAULT_PAYLOAD_MARKER.to_string(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            record_template: RecordTemplate::default(),
            max_batch_records: MAX_COLLECTION_RECORDS,
            policies: PipelinePolicies::default(),
            run_timeout: None,
        }
    }
}
