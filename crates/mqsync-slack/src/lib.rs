//! Slack collaborators for the payload sync.
//!
//! Reads channel history over the Web API and delivers failure alerts to an
//! incoming webhook.

pub mod alert_sink;
pub mod history_client;

pub use alert_sink::{
    AlertError, AlertSink, DisabledAlertSink, SlackWebhookAlertSink, ALERT_TIMEOUT_MS,
};
pub use history_client::{
    ChatHistorySource, RetrievalError, SlackHistoryClient, SlackHistoryOptions,
    DEFAULT_SLACK_API_BASE,
};
