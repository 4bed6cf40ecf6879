//! Pure building blocks for the chat-to-object-store payload sync.
//!
//! Locates embedded event payloads in chat text, repairs their loose quoting
//! dialect, and shapes them into insertable records for the remote store.
//! Nothing in this crate performs I/O.

pub mod message;
pub mod outcome;
pub mod payload;
pub mod records;
pub mod retry;

pub use message::ChatMessage;
pub use outcome::{AggregateResult, SyncError, SyncOutcome};
pub use payload::{extract_payload, normalize_dialect, Extraction, DEFAULT_PAYLOAD_MARKER};
pub use records::{
    BuildError, EqualityFilter, FieldMap, Insertable, Queryable, QueryRequest, Queue,
    RecordBuilder, RecordTemplate, SyncRecord, DEFAULT_QUEUE_NAME, PAYLOAD_OBJECT_TYPE,
    QUEUE_OBJECT_TYPE,
};
