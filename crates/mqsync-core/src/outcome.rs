//! Per-record outcomes returned by the store and their run aggregate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Error descriptor attached to a rejected record.
pub struct SyncError {
    #[serde(rename = "statusCode")]
    pub status_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result for one submitted record, index-aligned with the request.
pub struct SyncOutcome {
    #[serde(default)]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SyncError>,
}

impl SyncOutcome {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            success: false,
            errors: vec![SyncError {
                status_code: status_code.into(),
                message: message.into(),
                fields: Vec::new(),
            }],
        }
    }

    /// Renders the error list as `CODE: message` entries joined with `; `.
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "UNKNOWN_ERROR: store reported failure without detail".to_string();
        }
        self.errors
            .iter()
            .map(|error| {
                if error.fields.is_empty() {
                    format!("{}: {}", error.status_code, error.message)
                } else {
                    format!(
                        "{}: {} (fields: {})",
                        error.status_code,
                        error.message,
                        error.fields.join(", ")
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Run-scoped success and failure counters.
pub struct AggregateResult {
    pub succeeded: usize,
    pub failed: usize,
}

impl AggregateResult {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        if outcome.success {
            self.succeeded = self.succeeded.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.saturating_add(self.failed)
    }
}
