//! Submits built records and returns index-aligned outcomes.

use mqsync_core::{Insertable, SyncOutcome, SyncRecord};
use mqsync_salesforce::{ObjectStore, StoreError};

use crate::{guard::RunGuard, PipelineStage, RunError, MAX_COLLECTION_RECORDS};

pub struct BulkSyncEngine {
    max_batch_records: usize,
}

impl BulkSyncEngine {
    pub fn new(max_batch_records: usize) -> Self {
        Self {
            max_batch_records: max_batch_records.clamp(1, MAX_COLLECTION_RECORDS),
        }
    }

    /// Sends the batch with per-record independence. Requests are split only
    /// when the batch exceeds the collection limit; outcomes are concatenated
    /// in submission order. Inserts are never retried.
    pub(crate) async fn submit(
        &self,
        store: &dyn ObjectStore,
        records: &[SyncRecord],
        guard: &RunGuard,
    ) -> Result<Vec<SyncOutcome>, RunError> {
        let mut outcomes = Vec::with_capacity(records.len());
        if records.is_empty() {
            tracing::info!("no records built, batch submission skipped");
            return Ok(outcomes);
        }

        for chunk in records.chunks(self.max_batch_records) {
            let refs = chunk
                .iter()
                .map(|record| record as &dyn Insertable)
                .collect::<Vec<_>>();
            let chunk_outcomes = guard
                .run(PipelineStage::BatchSubmission, store.insert_collection(&refs))
                .await
                .map_err(|interruption| RunError::BatchInterrupted {
                    submitted_records: outcomes.len(),
                    source: Box::new(interruption),
                })?
                .map_err(|source| RunError::BatchSubmission {
                    submitted_records: outcomes.len(),
                    source,
                })?;
            if chunk_outcomes.len() != chunk.len() {
                return Err(RunError::BatchSubmission {
                    submitted_records: outcomes.len(),
                    source: StoreError::InvalidResponse(format!(
                        "collection insert returned {} results for {} records",
                        chunk_outcomes.len(),
                        chunk.len()
                    )),
                });
            }
            outcomes.extend(chunk_outcomes);
        }

        tracing::info!(records = records.len(), "batch submitted");
        Ok(outcomes)
    }
}
