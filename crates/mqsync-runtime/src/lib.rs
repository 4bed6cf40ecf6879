//! Pipeline runtime for syncing chat-embedded payloads into the object store.
//!
//! Owns the run-scoped context, queue resolution, record building, bulk
//! submission and failure alerting. Collaborators are injected through the
//! `StoreConnector`, `ChatHistorySource` and `AlertSink` traits.

mod alerts;
mod bulk_sync;
mod config;
mod context;
mod coordinator;
mod error;
mod guard;
mod queue_resolver;
mod record_stage;

pub use alerts::render_alert_message;
pub use bulk_sync::BulkSyncEngine;
pub use config::{
    AmbiguousQueuePolicy, HistoryWindow, PayloadCheckPolicy, PipelineConfig, PipelinePolicies,
    RepeatedMarkerPolicy, MAX_COLLECTION_RECORDS,
};
pub use context::{AlertStats, BuildStats, PipelineState, RunContext, RunReport};
pub use coordinator::PipelineCoordinator;
pub use error::{PipelineStage, RunError};
pub use queue_resolver::QueueResolver;
pub use record_stage::build_records;
