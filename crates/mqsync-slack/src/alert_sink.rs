//! Out-of-band failure alerts over a Slack incoming webhook.

use std::time::Duration;

use async_trait::async_trait;
use mqsync_core::retry::truncate_for_error;
use serde::Serialize;
use thiserror::Error;

pub const ALERT_TIMEOUT_MS: u64 = 10_000;
const WEBHOOK_OK_BODY: &str = "ok";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert webhook is not configured")]
    NotConfigured,
    #[error("alert transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("alert webhook returned non-ok response (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
/// Trait contract for `AlertSink` behavior.
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), AlertError>;
}

#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` to an incoming webhook.
///
/// Delivery succeeds only when the receiver answers 200 with the literal body
/// `ok`. Receivers that reply with structured JSON are reported as failures.
pub struct SlackWebhookAlertSink {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookAlertSink {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, AlertError> {
        Self::with_timeout(webhook_url, ALERT_TIMEOUT_MS)
    }

    pub fn with_timeout(webhook_url: impl Into<String>, timeout_ms: u64) -> Result<Self, AlertError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for SlackWebhookAlertSink {
    async fn deliver(&self, text: &str) -> Result<(), AlertError> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&WebhookBody { text })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK || body != WEBHOOK_OK_BODY {
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body: truncate_for_error(&body, 320),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Sink used when no webhook is configured; every delivery fails.
pub struct DisabledAlertSink;

#[async_trait]
impl AlertSink for DisabledAlertSink {
    async fn deliver(&self, _text: &str) -> Result<(), AlertError> {
        Err(AlertError::NotConfigured)
    }
}
