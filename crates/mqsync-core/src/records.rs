//! Record shapes exchanged with the remote object store.

use chrono::{DateTime, TimeZone};
use serde_json::{Map, Value};
use thiserror::Error;

pub type FieldMap = Map<String, Value>;

pub const PAYLOAD_OBJECT_TYPE: &str = "MQ_Payload__c";
pub const QUEUE_OBJECT_TYPE: &str = "MQ_Queue__c";
pub const DEFAULT_QUEUE_NAME: &str = "MQWebhookV1RestService";
pub const DEFAULT_NAME_SEPARATOR: &str = " - Slack - ";
pub const DEFAULT_INITIAL_STATUS: &str = "Queued";
pub const RECORD_NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const FIELD_ID: &str = "Id";
pub const FIELD_NAME: &str = "Name";
pub const FIELD_QUEUE: &str = "MQ_Queue__c";
pub const FIELD_STATUS: &str = "Status__c";
pub const FIELD_REQUEST: &str = "Request__c";

/// Trait contract for records that can be written through a collection insert.
pub trait Insertable: Send + Sync {
    fn object_type(&self) -> &str;
    fn fields(&self) -> &FieldMap;
}

/// Trait contract for records that describe a read against the store.
pub trait Queryable: Send + Sync {
    fn object_type(&self) -> &str;
    fn id(&self) -> Option<&str>;
    fn field_list(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Query for records of one object type, optionally filtered by field equality.
pub struct QueryRequest {
    pub object_type: String,
    pub fields: Vec<String>,
    pub filter: Option<EqualityFilter>,
}

impl QueryRequest {
    pub fn new(object_type: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            object_type: object_type.into(),
            fields: fields.iter().map(|field| field.to_string()).collect(),
            filter: None,
        }
    }

    pub fn where_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(EqualityFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }
}

impl Queryable for QueryRequest {
    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn id(&self) -> Option<&str> {
        None
    }

    fn field_list(&self) -> &[String] {
        &self.fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Routing record every synchronized payload is attached to.
pub struct Queue {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Queue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    /// Reads `Id` and `Name` from a queried field map. Blank or non-string
    /// values are treated as missing; other values are kept verbatim.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };
        Self {
            id: text(FIELD_ID),
            name: text(FIELD_NAME),
        }
    }

    pub fn query(lookup_name: &str) -> QueryRequest {
        QueryRequest::new(QUEUE_OBJECT_TYPE, &[FIELD_ID, FIELD_NAME])
            .where_equals(FIELD_NAME, lookup_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Constants stamped onto every record built in a run.
pub struct RecordTemplate {
    pub object_type: String,
    pub initial_status: String,
    pub name_separator: String,
}

impl Default for RecordTemplate {
    fn default() -> Self {
        Self {
            object_type: PAYLOAD_OBJECT_TYPE.to_string(),
            initial_status: DEFAULT_INITIAL_STATUS.to_string(),
            name_separator: DEFAULT_NAME_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Insertable payload record. The store assigns the identifier.
pub struct SyncRecord {
    object_type: String,
    fields: FieldMap,
}

impl SyncRecord {
    pub fn name(&self) -> Option<&str> {
        self.fields.get(FIELD_NAME).and_then(Value::as_str)
    }

    pub fn request_body(&self) -> Option<&str> {
        self.fields.get(FIELD_REQUEST).and_then(Value::as_str)
    }
}

impl Insertable for SyncRecord {
    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("queue record is missing required field '{field}'")]
    MissingQueueField { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct RecordBuilder<'a> {
    template: &'a RecordTemplate,
    queue: &'a Queue,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(template: &'a RecordTemplate, queue: &'a Queue) -> Self {
        Self { template, queue }
    }

    pub fn build<Tz>(&self, payload: &str, now: &DateTime<Tz>) -> Result<SyncRecord, BuildError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let queue_id = self
            .queue
            .id
            .as_deref()
            .ok_or(BuildError::MissingQueueField { field: FIELD_ID })?;
        let queue_name = self
            .queue
            .name
            .as_deref()
            .ok_or(BuildError::MissingQueueField { field: FIELD_NAME })?;

        let display_name = format!(
            "{queue_name}{}{}",
            self.template.name_separator,
            now.format(RECORD_NAME_TIMESTAMP_FORMAT)
        );

        let mut fields = FieldMap::new();
        fields.insert(FIELD_QUEUE.to_string(), Value::String(queue_id.to_string()));
        fields.insert(FIELD_NAME.to_string(), Value::String(display_name));
        fields.insert(
            FIELD_STATUS.to_string(),
            Value::String(self.template.initial_status.clone()),
        );
        fields.insert(FIELD_REQUEST.to_string(), Value::String(payload.to_string()));

        Ok(SyncRecord {
            object_type: self.template.object_type.clone(),
            fields,
        })
    }
}
