use mqsync_core::{SyncOutcome, SyncRecord};
use mqsync_slack::AlertSink;

use crate::AlertStats;

pub fn render_alert_message(index: usize, record: &SyncRecord, outcome: &SyncOutcome) -> String {
    format!(
        "MQ payload sync failed for record {} ({}): {}\nRequest: {}",
        index + 1,
        record.name().unwrap_or("unnamed"),
        outcome.error_summary(),
        record.request_body().unwrap_or_default()
    )
}

/// Fires one alert. Delivery failures are logged and counted, never raised.
pub(crate) async fn dispatch_alert(sink: &dyn AlertSink, text: &str, stats: &mut AlertStats) {
    stats.attempted += 1;
    match sink.deliver(text).await {
        Ok(()) => stats.delivered += 1,
        Err(error) => {
            stats.failed += 1;
            tracing::warn!(%error, "failure alert not delivered");
        }
    }
}
