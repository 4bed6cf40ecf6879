//! Single-pass pipeline from chat history to store records and alerts.

use std::sync::Arc;

use mqsync_salesforce::StoreConnector;
use mqsync_slack::{AlertSink, ChatHistorySource};
use tokio::sync::watch;

use crate::{
    alerts::{dispatch_alert, render_alert_message},
    guard::RunGuard,
    record_stage::build_records,
    BulkSyncEngine, PipelineConfig, PipelineStage, PipelineState, QueueResolver, RunContext,
    RunError, RunReport,
};

/// Drives one run: authenticate, retrieve, resolve the queue, build, sync, report.
///
/// Failures before `Synced` abort the run. After that, per-record rejections
/// are counted and alerted without stopping the walk.
pub struct PipelineCoordinator<'a> {
    config: &'a PipelineConfig,
    connector: Arc<dyn StoreConnector>,
    history: Arc<dyn ChatHistorySource>,
    alerts: Arc<dyn AlertSink>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<'a> PipelineCoordinator<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        connector: Arc<dyn StoreConnector>,
        history: Arc<dyn ChatHistorySource>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            config,
            connector,
            history,
            alerts,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run(&self) -> Result<RunReport, RunError> {
        let config = self.config;
        let guard = RunGuard::new(config.run_timeout, self.cancel.clone());
        let mut context = RunContext::new();
        tracing::info!(
            channel = config.channel_id.as_str(),
            from = %config.window.from,
            to = %config.window.to,
            "sync run started"
        );

        let store = guard
            .run(PipelineStage::Authentication, self.connector.open_store())
            .await?
            .map_err(RunError::Authentication)?;
        context.advance(PipelineState::Authenticated);

        let messages = guard
            .run(
                PipelineStage::Retrieval,
                self.history
                    .retrieve(&config.channel_id, config.window.from, config.window.to),
            )
            .await?
            .map_err(RunError::Retrieval)?;
        tracing::info!(messages = messages.len(), "chat history retrieved");

        let queue = QueueResolver::new(&config.queue_name, config.policies.ambiguous_queue)
            .resolve(store.as_ref(), &mut context, &guard)
            .await?;
        context.advance(PipelineState::QueueResolved);

        let records = build_records(&messages, &queue, config, &mut context.stats);
        context.advance(PipelineState::RecordsBuilt);
        if context.stats.build_skipped > 0 {
            tracing::warn!(
                skipped = context.stats.build_skipped,
                "records never submitted because the queue record is incomplete"
            );
        }

        let outcomes = BulkSyncEngine::new(config.max_batch_records)
            .submit(store.as_ref(), &records, &guard)
            .await?;
        context.advance(PipelineState::Synced);

        for (index, (record, outcome)) in records.iter().zip(outcomes.iter()).enumerate() {
            context.aggregate.record(outcome);
            if outcome.success {
                continue;
            }
            tracing::warn!(
                index,
                name = record.name().unwrap_or_default(),
                errors = outcome.error_summary().as_str(),
                "record rejected by store"
            );
            let text = render_alert_message(index, record, outcome);
            dispatch_alert(self.alerts.as_ref(), &text, &mut context.alerts).await;
        }

        context.advance(PipelineState::Reported);
        let report = context.into_report();
        tracing::info!(
            succeeded = report.aggregate.succeeded,
            failed = report.aggregate.failed,
            messages = report.stats.messages_seen,
            without_marker = report.stats.without_marker,
            build_skipped = report.stats.build_skipped,
            invalid_payload = report.stats.invalid_payload,
            repeated_marker_skipped = report.stats.repeated_marker_skipped,
            alerts_failed = report.alerts.failed,
            "sync run reported"
        );
        Ok(report)
    }
}
