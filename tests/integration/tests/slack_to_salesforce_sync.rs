use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use httpmock::prelude::*;
use mqsync_cli::{run_sync, Cli};
use mqsync_runtime::{HistoryWindow, PipelineConfig, PipelineCoordinator, PipelineState};
use mqsync_salesforce::{
    PasswordAuthenticator, PasswordCredentials, SalesforceClientOptions, SalesforceConnector,
};
use mqsync_slack::{SlackHistoryClient, SlackHistoryOptions, SlackWebhookAlertSink};
use serde_json::json;
use tokio::sync::watch;

const QUEUE_SOQL: &str = "SELECT Id, Name FROM MQ_Queue__c WHERE Name = 'MQWebhookV1RestService'";

fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    let instance_url = server.base_url();
    server.mock(move |when, then| {
        when.method(POST)
            .path("/services/oauth2/token")
            .body_includes("grant_type=password")
            .body_includes("username=sync%40example.test");
        then.status(200).json_body(json!({
            "access_token": "00Dsession",
            "instance_url": instance_url,
            "token_type": "Bearer"
        }));
    })
}

fn mock_queue(server: &MockServer, records: serde_json::Value) -> httpmock::Mock<'_> {
    let total_size = records.as_array().map(Vec::len).unwrap_or_default();
    server.mock(move |when, then| {
        when.method(GET)
            .path("/services/data/v50.0/query")
            .query_param("q", QUEUE_SOQL)
            .header("authorization", "Bearer 00Dsession");
        then.status(200).json_body(json!({
            "done": true,
            "totalSize": total_size,
            "records": records
        }));
    })
}

fn mock_history(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/conversations.history")
            .query_param("channel", "C0SYNC")
            .header("authorization", "Bearer xoxb-sync");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"type": "message", "ts": "1725300000.000300", "text": "deploy finished"},
                {"type": "message", "ts": "1725200000.000200", "text": "event_detail:{'id': 2, 'active': True}"},
                {"type": "message", "ts": "1725160000.000100", "text": "new order event_detail:{'id': 1, 'active': False}"}
            ],
            "has_more": false
        }));
    })
}

fn window() -> HistoryWindow {
    HistoryWindow {
        from: Utc
            .with_ymd_and_hms(2024, 9, 1, 0, 0, 0)
            .single()
            .expect("from"),
        to: Utc
            .with_ymd_and_hms(2024, 9, 30, 0, 0, 0)
            .single()
            .expect("to"),
    }
}

#[tokio::test]
async fn integration_pipeline_syncs_payloads_and_alerts_rejections() {
    let salesforce = MockServer::start();
    let slack = MockServer::start();

    let token = mock_token(&salesforce);
    let queue = mock_queue(
        &salesforce,
        json!([{"attributes": {"type": "MQ_Queue__c"}, "Id": "a0Q000000000001", "Name": "MQWebhookV1RestService"}]),
    );
    let insert = salesforce.mock(|when, then| {
        when.method(POST)
            .path("/services/data/v50.0/composite/sobjects")
            .json_body_includes(json!({"allOrNone": false}).to_string())
            .body_includes(r#""MQ_Queue__c":"a0Q000000000001""#)
            .body_includes(r#"\"active\": false"#);
        then.status(200).json_body(json!([
            {"id": "a0P000000000001", "success": true, "errors": []},
            {
                "id": null,
                "success": false,
                "errors": [{"statusCode": "DUPLICATE_VALUE", "message": "duplicate request", "fields": []}]
            }
        ]));
    });
    let history = mock_history(&slack);
    let webhook = slack.mock(|when, then| {
        when.method(POST)
            .path("/hooks/alerts")
            .body_includes("MQ payload sync failed for record 2")
            .body_includes("DUPLICATE_VALUE");
        then.status(200).body("ok");
    });

    let authenticator = PasswordAuthenticator::new(
        PasswordCredentials {
            login_url: salesforce.base_url(),
            username: "sync@example.test".to_string(),
            password: "secret".to_string(),
            client_id: "consumer".to_string(),
            client_secret: "consumer-secret".to_string(),
        },
        2_000,
    )
    .expect("authenticator");
    let connector = SalesforceConnector::new(
        Arc::new(authenticator),
        SalesforceClientOptions {
            retry_base_delay_ms: 1,
            ..SalesforceClientOptions::default()
        },
    );
    let history_client = SlackHistoryClient::new(SlackHistoryOptions {
        api_base: slack.url("/api"),
        token: "xoxb-sync".to_string(),
        cookie: None,
        request_timeout_ms: 2_000,
        retry_max_attempts: 2,
        retry_base_delay_ms: 1,
    })
    .expect("history client");
    let sink = SlackWebhookAlertSink::new(slack.url("/hooks/alerts")).expect("sink");

    let config = PipelineConfig::new("C0SYNC", window());
    let report = PipelineCoordinator::new(
        &config,
        Arc::new(connector),
        Arc::new(history_client),
        Arc::new(sink),
    )
    .run()
    .await
    .expect("run");

    token.assert();
    queue.assert();
    history.assert();
    insert.assert();
    webhook.assert();
    assert_eq!(report.final_state, PipelineState::Reported);
    assert_eq!(report.aggregate.succeeded, 1);
    assert_eq!(report.aggregate.failed, 1);
    assert_eq!(report.stats.messages_seen, 3);
    assert_eq!(report.stats.without_marker, 1);
    assert_eq!(report.alerts.delivered, 1);
    assert_eq!(report.alerts.failed, 0);
}

#[tokio::test]
async fn integration_cli_run_aborts_when_queue_is_missing() {
    let salesforce = MockServer::start();
    let slack = MockServer::start();

    let token = mock_token(&salesforce);
    let queue = mock_queue(&salesforce, json!([]));
    let history = mock_history(&slack);
    let insert = salesforce.mock(|when, then| {
        when.method(POST).path("/services/data/v50.0/composite/sobjects");
        then.status(200).json_body(json!([]));
    });

    let salesforce_url = salesforce.base_url();
    let slack_api_base = slack.url("/api");
    let cli = Cli::try_parse_from([
        "mqsync",
        "--slack-token",
        "xoxb-sync",
        "--slack-channel-id",
        "C0SYNC",
        "--slack-api-base",
        slack_api_base.as_str(),
        "--slack-webhook",
        "",
        "--salesforce-url",
        salesforce_url.as_str(),
        "--auth-mode",
        "password",
        "--username",
        "sync@example.test",
        "--password",
        "secret",
        "--client-id",
        "consumer",
        "--client-secret",
        "consumer-secret",
        "--from",
        "2024-09-01T00:00:00Z",
        "--to",
        "2024-09-30T00:00:00Z",
        "--retry-base-delay-ms",
        "1",
    ])
    .expect("parse cli");

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let error = run_sync(&cli, cancel_rx).await.expect_err("missing queue");

    token.assert();
    history.assert();
    queue.assert();
    insert.assert_calls(0);
    let rendered = format!("{error:#}");
    assert!(rendered.contains("queue_resolution"), "{rendered}");
    assert!(rendered.contains("MQWebhookV1RestService"), "{rendered}");
}
