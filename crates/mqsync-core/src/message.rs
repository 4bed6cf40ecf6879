use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Chat transcript message as delivered by the history collaborator.
pub struct ChatMessage {
    /// Slack-style `"<seconds>.<micros>"` timestamp.
    pub ts: String,
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    pub fn new(ts: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            text: text.into(),
        }
    }

    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        let (seconds, fraction) = match self.ts.trim().split_once('.') {
            Some((seconds, fraction)) => (seconds, fraction),
            None => (self.ts.trim(), ""),
        };
        let seconds = seconds.parse::<i64>().ok()?;
        let micros = if fraction.is_empty() {
            0
        } else {
            let digits = fraction.chars().take(6).collect::<String>();
            let padded = format!("{digits:0<6}");
            padded.parse::<u32>().ok()?
        };
        DateTime::from_timestamp(seconds, micros.saturating_mul(1_000))
    }
}
