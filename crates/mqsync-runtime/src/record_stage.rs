//! Turns transcript messages into insertable records.

use chrono::Local;
use mqsync_core::{
    extract_payload, normalize_dialect, ChatMessage, Extraction, Queue, RecordBuilder,
    SyncRecord,
};
use serde_json::Value;

use crate::{BuildStats, PayloadCheckPolicy, PipelineConfig, RepeatedMarkerPolicy};

/// Builds one record per qualifying message, preserving message order.
///
/// Messages without the marker are skipped silently. Every other skip is
/// logged and counted so operators can tell "never submitted" apart from
/// "submitted and rejected".
pub fn build_records(
    messages: &[ChatMessage],
    queue: &Queue,
    config: &PipelineConfig,
    stats: &mut BuildStats,
) -> Vec<SyncRecord> {
    let builder = RecordBuilder::new(&config.record_template, queue);
    let mut records = Vec::new();

    for message in messages {
        stats.messages_seen += 1;
        let extraction = extract_payload(&message.text, &config.marker);
        let candidate = match &extraction {
            Extraction::Absent => {
                stats.without_marker += 1;
                continue;
            }
            Extraction::Found { candidate, .. } => candidate,
        };

        if extraction.has_repeated_marker() {
            stats.repeated_marker += 1;
            match config.policies.repeated_marker {
                RepeatedMarkerPolicy::Forward => tracing::warn!(
                    ts = message.ts.as_str(),
                    "message carries repeated payload marker, forwarding text after the first"
                ),
                RepeatedMarkerPolicy::Skip => {
                    stats.repeated_marker_skipped += 1;
                    tracing::warn!(
                        ts = message.ts.as_str(),
                        "message carries repeated payload marker, skipped"
                    );
                    continue;
                }
            }
        }

        let normalized = normalize_dialect(candidate);
        if config.policies.payload_check == PayloadCheckPolicy::RequireJson {
            if let Err(error) = serde_json::from_str::<Value>(&normalized) {
                stats.invalid_payload += 1;
                tracing::warn!(
                    ts = message.ts.as_str(),
                    %error,
                    "normalized payload is not valid json, skipped"
                );
                continue;
            }
        }

        match builder.build(&normalized, &Local::now()) {
            Ok(record) => records.push(record),
            Err(error) => {
                stats.build_skipped += 1;
                tracing::warn!(ts = message.ts.as_str(), %error, "record build skipped");
            }
        }
    }

    stats.records_built = records.len();
    records
}
