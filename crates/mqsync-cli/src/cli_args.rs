use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use clap::Parser;
use mqsync_core::{DEFAULT_PAYLOAD_MARKER, DEFAULT_QUEUE_NAME};
use mqsync_runtime::{
    HistoryWindow, PipelineConfig, PipelinePolicies, MAX_COLLECTION_RECORDS,
};
use mqsync_salesforce::DEFAULT_API_VERSION;
use mqsync_slack::DEFAULT_SLACK_API_BASE;

use crate::{CliAmbiguousQueuePolicy, CliAuthMode, CliPayloadCheckPolicy, CliRepeatedMarkerPolicy};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    let parsed = parse_positive_usize(value)?;
    if parsed > MAX_COLLECTION_RECORDS {
        return Err(format!("value must be at most {MAX_COLLECTION_RECORDS}"));
    }
    Ok(parsed)
}

/// Accepts RFC 3339 instants or `YYYY-MM-DD` dates (local midnight).
pub fn parse_window_bound(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid time bound '{value}'; expected RFC 3339 or YYYY-MM-DD"))?;
    local_midnight(date)
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid midnight for {date}"))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("local midnight does not exist for {date}"))
}

/// September 1 of the current year at local midnight.
pub fn default_window_start(now: DateTime<Local>) -> Result<DateTime<Utc>> {
    let year = now.year();
    let date = NaiveDate::from_ymd_opt(year, 9, 1)
        .with_context(|| format!("invalid September 1 for year {year}"))?;
    local_midnight(date)
}

#[derive(Debug, Parser)]
#[command(
    name = "mqsync",
    about = "Sync event payloads embedded in Slack channel history into MQ payload records",
    version
)]
/// Process configuration, read from flags or the environment (and `.env`).
pub struct Cli {
    #[arg(
        long = "slack-token",
        env = "SLACK_TOKEN",
        hide_env_values = true,
        help = "Slack token used to read channel history"
    )]
    pub slack_token: String,

    #[arg(
        long = "slack-cookie",
        env = "SLACK_COOKIE",
        hide_env_values = true,
        help = "Slack 'd' session cookie paired with xoxc- tokens"
    )]
    pub slack_cookie: Option<String>,

    #[arg(
        long = "slack-channel-id",
        env = "SLACK_CHANNELID",
        help = "Slack channel id whose history is scanned for payloads"
    )]
    pub slack_channel_id: String,

    #[arg(
        long = "slack-webhook",
        env = "SLACK_WEBHOOK",
        hide_env_values = true,
        help = "Incoming webhook URL receiving failure alerts"
    )]
    pub slack_webhook: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "MQSYNC_SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Base URL for the Slack Web API"
    )]
    pub slack_api_base: String,

    #[arg(
        long,
        env = "MQSYNC_FROM",
        help = "Window start (RFC 3339 or YYYY-MM-DD). Defaults to September 1 at local midnight"
    )]
    pub from: Option<String>,

    #[arg(
        long,
        env = "MQSYNC_TO",
        help = "Window end (RFC 3339 or YYYY-MM-DD). Defaults to now"
    )]
    pub to: Option<String>,

    #[arg(
        long = "salesforce-url",
        env = "SALESFORCE_URL",
        help = "Login URL used for the OAuth token exchange"
    )]
    pub salesforce_url: String,

    #[arg(
        long = "auth-mode",
        env = "MQSYNC_AUTH_MODE",
        value_enum,
        default_value_t = CliAuthMode::Jwt,
        help = "OAuth flow used to open the store session"
    )]
    pub auth_mode: CliAuthMode,

    #[arg(
        long = "jwt-path",
        env = "JWT_PATH",
        help = "PEM private key signing the JWT bearer assertion"
    )]
    pub jwt_path: Option<PathBuf>,

    #[arg(
        long = "jwt-client-id",
        env = "JWT_CLIENTID",
        help = "Connected app consumer key for the JWT bearer flow"
    )]
    pub jwt_client_id: Option<String>,

    #[arg(
        long = "jwt-user",
        env = "JWT_USER",
        help = "Username the JWT bearer assertion is issued for"
    )]
    pub jwt_user: Option<String>,

    #[arg(
        long = "username",
        env = "USERNAME",
        help = "Username for the password flow"
    )]
    pub username: Option<String>,

    #[arg(
        long = "password",
        env = "PASSWORD",
        hide_env_values = true,
        help = "Password (with security token) for the password flow"
    )]
    pub password: Option<String>,

    #[arg(
        long = "client-id",
        env = "CLIENTID",
        help = "Connected app consumer key for the password flow"
    )]
    pub client_id: Option<String>,

    #[arg(
        long = "client-secret",
        env = "CLIENTSECRET",
        hide_env_values = true,
        help = "Connected app consumer secret for the password flow"
    )]
    pub client_secret: Option<String>,

    #[arg(
        long = "api-version",
        env = "MQSYNC_API_VERSION",
        default_value = DEFAULT_API_VERSION,
        help = "REST API version used for queries and collection inserts"
    )]
    pub api_version: String,

    #[arg(
        long = "queue-name",
        env = "MQSYNC_QUEUE_NAME",
        default_value = DEFAULT_QUEUE_NAME,
        help = "Name of the queue record every payload is routed to"
    )]
    pub queue_name: String,

    #[arg(
        long = "payload-marker",
        env = "MQSYNC_PAYLOAD_MARKER",
        default_value = DEFAULT_PAYLOAD_MARKER,
        help = "Token that precedes an embedded payload in message text"
    )]
    pub payload_marker: String,

    #[arg(
        long = "max-batch-records",
        env = "MQSYNC_MAX_BATCH_RECORDS",
        default_value_t = MAX_COLLECTION_RECORDS,
        value_parser = parse_batch_size,
        help = "Records per collection insert request"
    )]
    pub max_batch_records: usize,

    #[arg(
        long = "ambiguous-queue",
        env = "MQSYNC_AMBIGUOUS_QUEUE",
        value_enum,
        default_value_t = CliAmbiguousQueuePolicy::UseFirst,
        help = "Behavior when the queue lookup matches several records"
    )]
    pub ambiguous_queue: CliAmbiguousQueuePolicy,

    #[arg(
        long = "repeated-marker",
        env = "MQSYNC_REPEATED_MARKER",
        value_enum,
        default_value_t = CliRepeatedMarkerPolicy::Forward,
        help = "Behavior when a message carries the payload marker more than once"
    )]
    pub repeated_marker: CliRepeatedMarkerPolicy,

    #[arg(
        long = "payload-check",
        env = "MQSYNC_PAYLOAD_CHECK",
        value_enum,
        default_value_t = CliPayloadCheckPolicy::Forward,
        help = "Whether normalized payloads must parse as JSON before submission"
    )]
    pub payload_check: CliPayloadCheckPolicy,

    #[arg(
        long = "request-timeout-ms",
        env = "MQSYNC_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        help = "Timeout in milliseconds for each Slack and store request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "MQSYNC_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Attempts for idempotent reads (history pages, queue lookup)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "MQSYNC_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff in milliseconds between read retries"
    )]
    pub retry_base_delay_ms: u64,

    #[arg(
        long = "run-timeout-seconds",
        env = "MQSYNC_RUN_TIMEOUT_SECONDS",
        default_value_t = 0,
        help = "Deadline for the whole run in seconds (0 disables)"
    )]
    pub run_timeout_seconds: u64,
}

impl Cli {
    /// Resolves the history window. An explicit start after the end is an
    /// error; a defaulted start after the end collapses to an empty window.
    pub fn history_window(&self, now: DateTime<Local>) -> Result<HistoryWindow> {
        let to = match self.to.as_deref() {
            Some(value) => parse_window_bound(value)?,
            None => now.with_timezone(&Utc),
        };
        let from = match self.from.as_deref() {
            Some(value) => parse_window_bound(value)?,
            None => {
                let start = default_window_start(now)?;
                if start > to {
                    tracing::warn!(
                        default_start = %start,
                        end = %to,
                        "default window start is after the end; nothing will be retrieved, pass --from to choose a start"
                    );
                    to
                } else {
                    start
                }
            }
        };
        if from > to {
            bail!("history window start {from} is after end {to}");
        }
        Ok(HistoryWindow { from, to })
    }

    pub fn into_pipeline_config(&self, now: DateTime<Local>) -> Result<PipelineConfig> {
        if self.slack_channel_id.trim().is_empty() {
            bail!("slack channel id must not be empty");
        }
        if self.payload_marker.is_empty() {
            bail!("payload marker must not be empty");
        }
        let mut config = PipelineConfig::new(self.slack_channel_id.trim(), self.history_window(now)?);
        config.marker = self.payload_marker.clone();
        config.queue_name = self.queue_name.clone();
        config.max_batch_records = self.max_batch_records;
        config.policies = PipelinePolicies {
            ambiguous_queue: self.ambiguous_queue.into(),
            repeated_marker: self.repeated_marker.into(),
            payload_check: self.payload_check.into(),
        };
        config.run_timeout =
            (self.run_timeout_seconds > 0).then(|| Duration::from_secs(self.run_timeout_seconds));
        Ok(config)
    }
}
