//! Resolves the routing queue once per run.

use mqsync_core::Queue;
use mqsync_salesforce::ObjectStore;

use crate::{
    guard::RunGuard, AmbiguousQueuePolicy, PipelineStage, RunContext, RunError,
};

pub struct QueueResolver<'a> {
    lookup_name: &'a str,
    policy: AmbiguousQueuePolicy,
}

impl<'a> QueueResolver<'a> {
    pub fn new(lookup_name: &'a str, policy: AmbiguousQueuePolicy) -> Self {
        Self {
            lookup_name,
            policy,
        }
    }

    pub(crate) async fn resolve(
        &self,
        store: &dyn ObjectStore,
        context: &mut RunContext,
        guard: &RunGuard,
    ) -> Result<Queue, RunError> {
        if let Some(queue) = context.queue() {
            return Ok(queue.clone());
        }

        let request = Queue::query(self.lookup_name);
        let matches = guard
            .run(PipelineStage::QueueResolution, store.query(&request))
            .await?
            .map_err(RunError::QueueLookup)?;

        let Some(first) = matches.first() else {
            return Err(RunError::QueueNotFound {
                name: self.lookup_name.to_string(),
            });
        };
        if matches.len() > 1 {
            match self.policy {
                AmbiguousQueuePolicy::UseFirst => tracing::warn!(
                    queue = self.lookup_name,
                    matches = matches.len(),
                    "queue lookup is ambiguous, using first match"
                ),
                AmbiguousQueuePolicy::Reject => {
                    return Err(RunError::AmbiguousQueue {
                        name: self.lookup_name.to_string(),
                        matches: matches.len(),
                    })
                }
            }
        }

        let queue = Queue::from_fields(first);
        if queue.id.is_none() || queue.name.is_none() {
            tracing::warn!(
                queue = self.lookup_name,
                has_id = queue.id.is_some(),
                has_name = queue.name.is_some(),
                "queue record is incomplete, records cannot be built"
            );
        } else {
            tracing::info!(
                queue = self.lookup_name,
                queue_id = queue.id.as_deref().unwrap_or_default(),
                "queue resolved"
            );
        }
        context.queue = Some(queue.clone());
        Ok(queue)
    }
}
