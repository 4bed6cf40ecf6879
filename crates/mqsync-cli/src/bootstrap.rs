use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use mqsync_runtime::{PipelineCoordinator, RunReport};
use mqsync_salesforce::{
    Authenticator, JwtBearerAuthenticator, JwtBearerCredentials, PasswordAuthenticator,
    PasswordCredentials, SalesforceClientOptions, SalesforceConnector, StoreConnector,
};
use mqsync_slack::{
    AlertSink, ChatHistorySource, DisabledAlertSink, SlackHistoryClient, SlackHistoryOptions,
    SlackWebhookAlertSink,
};
use tokio::sync::watch;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::{Cli, CliAuthMode};

pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{name} is required for the selected auth mode"),
    }
}

pub fn build_authenticator(cli: &Cli) -> Result<Arc<dyn Authenticator>> {
    let login_url = cli.salesforce_url.trim().to_string();
    if login_url.is_empty() {
        bail!("SALESFORCE_URL must not be empty");
    }
    match cli.auth_mode {
        CliAuthMode::Jwt => {
            let key_path = cli
                .jwt_path
                .clone()
                .context("JWT_PATH is required for the selected auth mode")?;
            let credentials = JwtBearerCredentials {
                login_url,
                client_id: required(cli.jwt_client_id.as_deref(), "JWT_CLIENTID")?.to_string(),
                username: required(cli.jwt_user.as_deref(), "JWT_USER")?.to_string(),
                key_path,
            };
            let authenticator = JwtBearerAuthenticator::new(credentials, cli.request_timeout_ms)
                .context("failed to build jwt bearer authenticator")?;
            Ok(Arc::new(authenticator))
        }
        CliAuthMode::Password => {
            let credentials = PasswordCredentials {
                login_url,
                username: required(cli.username.as_deref(), "USERNAME")?.to_string(),
                password: required(cli.password.as_deref(), "PASSWORD")?.to_string(),
                client_id: required(cli.client_id.as_deref(), "CLIENTID")?.to_string(),
                client_secret: required(cli.client_secret.as_deref(), "CLIENTSECRET")?
                    .to_string(),
            };
            let authenticator = PasswordAuthenticator::new(credentials, cli.request_timeout_ms)
                .context("failed to build password authenticator")?;
            Ok(Arc::new(authenticator))
        }
    }
}

pub fn build_store_connector(cli: &Cli) -> Result<Arc<dyn StoreConnector>> {
    let authenticator = build_authenticator(cli)?;
    let options = SalesforceClientOptions {
        api_version: cli.api_version.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    };
    Ok(Arc::new(SalesforceConnector::new(authenticator, options)))
}

pub fn build_history_source(cli: &Cli) -> Result<Arc<dyn ChatHistorySource>> {
    if cli.slack_token.trim().is_empty() {
        bail!("SLACK_TOKEN must not be empty");
    }
    let client = SlackHistoryClient::new(SlackHistoryOptions {
        api_base: cli.slack_api_base.clone(),
        token: cli.slack_token.clone(),
        cookie: cli
            .slack_cookie
            .clone()
            .filter(|cookie| !cookie.trim().is_empty()),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    })
    .context("failed to build slack history client")?;
    Ok(Arc::new(client))
}

pub fn build_alert_sink(cli: &Cli) -> Result<Arc<dyn AlertSink>> {
    match cli
        .slack_webhook
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        Some(url) => {
            let sink = SlackWebhookAlertSink::new(url).context("failed to build webhook sink")?;
            Ok(Arc::new(sink))
        }
        None => {
            tracing::warn!("SLACK_WEBHOOK is not set; failure alerts will not be delivered");
            Ok(Arc::new(DisabledAlertSink))
        }
    }
}

/// Runs one sync pass for the parsed configuration.
///
/// Flipping `cancel` to `true` aborts the in-flight stage.
pub async fn run_sync(cli: &Cli, cancel: watch::Receiver<bool>) -> Result<RunReport> {
    let config = cli.into_pipeline_config(Local::now())?;
    let connector = build_store_connector(cli)?;
    let history = build_history_source(cli)?;
    let alerts = build_alert_sink(cli)?;

    let coordinator = PipelineCoordinator::new(&config, connector, history, alerts)
        .with_cancellation(cancel);
    match coordinator.run().await {
        Ok(report) => Ok(report),
        Err(error) => {
            let stage = error.stage();
            tracing::error!(
                stage = %stage,
                submitted_records = ?error.submitted_records(),
                error = %error,
                "sync run aborted"
            );
            Err(anyhow::Error::new(error).context(format!("sync run failed during {stage}")))
        }
    }
}
