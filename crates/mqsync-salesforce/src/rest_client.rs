//! REST API client for SOQL queries and sObject collection inserts.

use std::time::Duration;

use async_trait::async_trait;
use mqsync_core::{
    retry::{is_retryable_status, parse_retry_after_seconds, retry_delay, truncate_for_error},
    FieldMap, Insertable, QueryRequest, SyncOutcome,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{soql::render_soql, ObjectStore, SalesforceSession, StoreError};

pub const DEFAULT_API_VERSION: &str = "50.0";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesforceClientOptions {
    pub api_version: String,
    pub request_timeout_ms: u64,
    /// Attempts for idempotent reads. Inserts are always sent once.
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for SalesforceClientOptions {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    next_records_url: Option<String>,
}

#[derive(Clone)]
pub struct SalesforceRestClient {
    http: reqwest::Client,
    session: SalesforceSession,
    options: SalesforceClientOptions,
}

impl SalesforceRestClient {
    pub fn new(
        session: SalesforceSession,
        options: SalesforceClientOptions,
    ) -> Result<Self, StoreError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("mqsync-salesforce"),
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
            session,
            options: SalesforceClientOptions {
                retry_max_attempts: options.retry_max_attempts.max(1),
                retry_base_delay_ms: options.retry_base_delay_ms.max(1),
                ..options
            },
        })
    }

    fn data_url(&self, suffix: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.session.instance_url,
            self.options.api_version.trim_start_matches('v'),
            suffix.trim_start_matches('/')
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("{} {}", self.session.token_type, self.session.access_token),
        )
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            match builder().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<T>().await?);
                    }
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after_seconds);
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.options.retry_max_attempts
                        && is_retryable_status(status.as_u16())
                    {
                        tracing::debug!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            "retrying store request"
                        );
                        tokio::time::sleep(retry_delay(
                            self.options.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }
                    return Err(StoreError::HttpStatus {
                        status: status.as_u16(),
                        body: truncate_for_error(&body, 800),
                    });
                }
                Err(error) => {
                    if attempt < self.options.retry_max_attempts
                        && (error.is_timeout() || error.is_connect())
                    {
                        tokio::time::sleep(retry_delay(
                            self.options.retry_base_delay_ms,
                            attempt,
                            None,
                        ))
                        .await;
                        continue;
                    }
                    return Err(StoreError::Http(error));
                }
            }
        }
    }
}

fn record_fields(record: Value) -> Result<FieldMap, StoreError> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!(
            "query record is not an object: {other}"
        ))),
    }
}

pub(crate) fn collection_payload(records: &[&dyn Insertable]) -> Value {
    let records = records
        .iter()
        .map(|record| {
            let mut fields = record.fields().clone();
            fields.insert(
                "attributes".to_string(),
                json!({ "type": record.object_type() }),
            );
            Value::Object(fields)
        })
        .collect::<Vec<_>>();
    json!({
        "allOrNone": false,
        "records": records,
    })
}

#[async_trait]
impl ObjectStore for SalesforceRestClient {
    async fn query(&self, request: &QueryRequest) -> Result<Vec<FieldMap>, StoreError> {
        let statement = render_soql(request);
        tracing::debug!(soql = statement.as_str(), "querying store");

        let query_url = self.data_url("query");
        let mut page: QueryResponse = self
            .request_json("query", || {
                self.authorized(self.http.get(&query_url))
                    .query(&[("q", statement.as_str())])
            })
            .await?;

        let mut records = Vec::with_capacity(page.records.len());
        loop {
            for record in std::mem::take(&mut page.records) {
                records.push(record_fields(record)?);
            }
            let next = match page.next_records_url.take() {
                Some(next) if !page.done => next,
                _ => break,
            };
            let next_url = format!("{}{}", self.session.instance_url, next);
            page = self
                .request_json("query more", || self.authorized(self.http.get(&next_url)))
                .await?;
        }
        Ok(records)
    }

    async fn insert_collection(
        &self,
        records: &[&dyn Insertable],
    ) -> Result<Vec<SyncOutcome>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let payload = collection_payload(records);
        let response = self
            .authorized(self.http.post(self.data_url("composite/sobjects")))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body: truncate_for_error(&body, 800),
            });
        }
        let outcomes = response.json::<Vec<SyncOutcome>>().await?;
        if outcomes.len() != records.len() {
            return Err(StoreError::InvalidResponse(format!(
                "collection insert returned {} results for {} records",
                outcomes.len(),
                records.len()
            )));
        }
        Ok(outcomes)
    }
}
