//! Channel history retrieval over the Slack Web API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mqsync_core::{
    retry::{is_retryable_status, parse_retry_after_seconds, retry_delay, truncate_for_error},
    ChatMessage,
};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const HISTORY_PAGE_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("history window is empty: from {from} is after to {to}")]
    InvalidWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    #[error("slack history request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slack history returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("slack conversations.history failed: {error}")]
    Api { error: String },
}

#[async_trait]
/// Trait contract for `ChatHistorySource` behavior.
pub trait ChatHistorySource: Send + Sync {
    /// Returns the channel's messages inside `[from, to]`, oldest first.
    async fn retrieve(
        &self,
        channel: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, RetrievalError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackHistoryOptions {
    pub api_base: String,
    pub token: String,
    /// Browser session cookie paired with `xoxc-` tokens. Either the bare value
    /// or a full `d=...` pair.
    pub cookie: Option<String>,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Clone)]
pub struct SlackHistoryClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    cookie: Option<String>,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

fn slack_timestamp(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}

fn cookie_header(cookie: &str) -> String {
    let cookie = cookie.trim();
    if cookie.contains('=') {
        cookie.to_string()
    } else {
        format!("d={cookie}")
    }
}

impl SlackHistoryClient {
    pub fn new(options: SlackHistoryOptions) -> Result<Self, RetrievalError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("mqsync-slack-history"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(options.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: options.api_base.trim_end_matches('/').to_string(),
            token: options.token.trim().to_string(),
            cookie: options
                .cookie
                .map(|cookie| cookie_header(&cookie))
                .filter(|cookie| cookie != "d="),
            retry_max_attempts: options.retry_max_attempts.max(1),
            retry_base_delay_ms: options.retry_base_delay_ms.max(1),
        })
    }

    async fn fetch_page(
        &self,
        channel: &str,
        oldest: &str,
        latest: &str,
        cursor: Option<&str>,
    ) -> Result<HistoryResponse, RetrievalError> {
        let limit = HISTORY_PAGE_LIMIT.to_string();
        let mut query = vec![
            ("channel", channel),
            ("oldest", oldest),
            ("latest", latest),
            ("inclusive", "true"),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let mut request = self
                .http
                .get(format!("{}/conversations.history", self.api_base))
                .bearer_auth(&self.token)
                .query(&query);
            if let Some(cookie) = &self.cookie {
                request = request.header(reqwest::header::COOKIE, cookie);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<HistoryResponse>().await?);
                    }
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after_seconds);
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts && is_retryable_status(status.as_u16()) {
                        tracing::debug!(
                            channel,
                            status = status.as_u16(),
                            attempt,
                            "retrying slack history page"
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }
                    return Err(RetrievalError::HttpStatus {
                        status: status.as_u16(),
                        body: truncate_for_error(&body, 800),
                    });
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts
                        && (error.is_timeout() || error.is_connect())
                    {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(RetrievalError::Http(error));
                }
            }
        }
    }
}

#[async_trait]
impl ChatHistorySource for SlackHistoryClient {
    async fn retrieve(
        &self,
        channel: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, RetrievalError> {
        if from > to {
            return Err(RetrievalError::InvalidWindow { from, to });
        }
        let oldest = slack_timestamp(from);
        let latest = slack_timestamp(to);

        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .fetch_page(channel, &oldest, &latest, cursor.as_deref())
                .await?;
            if !page.ok {
                return Err(RetrievalError::Api {
                    error: page.error.unwrap_or_else(|| "unknown error".to_string()),
                });
            }
            messages.extend(page.messages);

            let next_cursor = page
                .response_metadata
                .map(|metadata| metadata.next_cursor)
                .filter(|next| !next.trim().is_empty());
            match next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        // Slack pages newest first; batch order follows arrival order.
        messages.sort_by(|left, right| {
            left.arrival()
                .cmp(&right.arrival())
                .then_with(|| left.ts.cmp(&right.ts))
        });
        tracing::debug!(channel, count = messages.len(), "slack history retrieved");
        Ok(messages)
    }
}
