//! SOQL rendering for equality queries.

use mqsync_core::{Queryable, QueryRequest};

pub fn escape_soql_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_soql(request: &QueryRequest) -> String {
    let fields = if request.field_list().is_empty() {
        "Id".to_string()
    } else {
        request.field_list().join(", ")
    };
    let mut statement = format!("SELECT {fields} FROM {}", request.object_type());
    if let Some(filter) = &request.filter {
        statement.push_str(&format!(
            " WHERE {} = '{}'",
            filter.field,
            escape_soql_literal(&filter.value)
        ));
    }
    statement
}

#[cfg(test)]
mod tests {
    use mqsync_core::{QueryRequest, Queue};

    use super::{escape_soql_literal, render_soql};

    #[test]
    fn unit_render_soql_builds_equality_query() {
        assert_eq!(
            render_soql(&Queue::query("MQWebhookV1RestService")),
            "SELECT Id, Name FROM MQ_Queue__c WHERE Name = 'MQWebhookV1RestService'"
        );
    }

    #[test]
    fn unit_render_soql_without_filter_or_fields() {
        assert_eq!(
            render_soql(&QueryRequest::new("Account", &[])),
            "SELECT Id FROM Account"
        );
    }

    #[test]
    fn regression_escape_soql_literal_neutralizes_quotes() {
        assert_eq!(escape_soql_literal("O'Brien\\x"), "O\\'Brien\\\\x");
    }
}
