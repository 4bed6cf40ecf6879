//! Embedded payload extraction and loose-dialect normalization.

/// Marker preceding an embedded event payload in chat transcripts.
pub const DEFAULT_PAYLOAD_MARKER: &str = "event_detail:";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of scanning one message body for an embedded payload.
pub enum Extraction {
    Absent,
    Found {
        /// Everything after the first marker occurrence, later markers included.
        candidate: String,
        /// Total marker occurrences in the message body.
        marker_count: usize,
    },
}

impl Extraction {
    pub fn candidate(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Found { candidate, .. } => Some(candidate.as_str()),
        }
    }

    pub fn has_repeated_marker(&self) -> bool {
        matches!(self, Self::Found { marker_count, .. } if *marker_count > 1)
    }
}

/// Returns the text following the first occurrence of `marker`.
///
/// A second marker does not start a new payload; it stays inside the
/// candidate. An empty marker never matches.
pub fn extract_payload(text: &str, marker: &str) -> Extraction {
    if marker.is_empty() {
        return Extraction::Absent;
    }
    let Some((_, candidate)) = text.split_once(marker) else {
        return Extraction::Absent;
    };
    Extraction::Found {
        candidate: candidate.to_string(),
        marker_count: text.matches(marker).count(),
    }
}

/// Rewrites single-quoted strings and capitalized `False` into standard JSON
/// tokens. No parsing happens here; malformed input passes through.
pub fn normalize_dialect(candidate: &str) -> String {
    candidate.replace('\'', "\"").replace("False", "false")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    use super::{extract_payload, normalize_dialect, Extraction, DEFAULT_PAYLOAD_MARKER};

    fn dialect_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Bool(false)),
            any::<i32>().prop_map(Value::from),
            "[a-z0-9 _.-]{0,12}".prop_map(Value::String),
        ]
    }

    fn render_dialect(fields: &BTreeMap<String, Value>) -> String {
        let entries = fields
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::Bool(false) => "False".to_string(),
                    Value::String(text) => format!("'{text}'"),
                    other => other.to_string(),
                };
                format!("'{key}': {rendered}")
            })
            .collect::<Vec<_>>();
        format!("{{{}}}", entries.join(", "))
    }

    #[test]
    fn unit_extract_payload_returns_text_after_first_marker() {
        let extraction = extract_payload(
            "deploy finished event_detail:{'a': 1}",
            DEFAULT_PAYLOAD_MARKER,
        );
        assert_eq!(
            extraction,
            Extraction::Found {
                candidate: "{'a': 1}".to_string(),
                marker_count: 1,
            }
        );
        assert!(!extraction.has_repeated_marker());
    }

    #[test]
    fn unit_extract_payload_reports_absent_marker() {
        let extraction = extract_payload("plain chatter without payload", DEFAULT_PAYLOAD_MARKER);
        assert_eq!(extraction, Extraction::Absent);
        assert_eq!(extraction.candidate(), None);
    }

    #[test]
    fn regression_extract_payload_keeps_second_marker_inside_candidate() {
        let extraction = extract_payload(
            "x event_detail:{'a': 1} event_detail:{'b': 2}",
            DEFAULT_PAYLOAD_MARKER,
        );
        assert_eq!(
            extraction.candidate(),
            Some("{'a': 1} event_detail:{'b': 2}")
        );
        assert!(extraction.has_repeated_marker());
    }

    #[test]
    fn regression_extract_payload_accepts_marker_at_end_of_text() {
        let extraction = extract_payload("trailing event_detail:", DEFAULT_PAYLOAD_MARKER);
        assert_eq!(extraction.candidate(), Some(""));
    }

    #[test]
    fn regression_extract_payload_empty_marker_never_matches() {
        assert_eq!(extract_payload("anything", ""), Extraction::Absent);
    }

    #[test]
    fn functional_normalize_dialect_produces_parseable_json() {
        let extraction = extract_payload(
            "...event_detail:{'a': 1, 'b': False}",
            DEFAULT_PAYLOAD_MARKER,
        );
        let normalized = normalize_dialect(extraction.candidate().expect("candidate"));
        assert_eq!(normalized, r#"{"a": 1, "b": false}"#);
        let parsed: Value = serde_json::from_str(&normalized).expect("valid json");
        assert_eq!(parsed, json!({"a": 1, "b": false}));
    }

    #[test]
    fn unit_normalize_dialect_is_idempotent() {
        let samples = [
            "{'topic': 'orders', 'retry': False}",
            r#"{"already": false, "ok": true}"#,
            "not json at all 'x' False False",
            "",
        ];
        for sample in samples {
            let once = normalize_dialect(sample);
            assert_eq!(normalize_dialect(&once), once, "sample: {sample}");
        }
    }

    #[test]
    fn regression_normalize_dialect_leaves_lowercase_false_and_true_untouched() {
        assert_eq!(
            normalize_dialect(r#"{"a": false, "b": True}"#),
            r#"{"a": false, "b": True}"#
        );
    }

    #[test]
    fn regression_normalize_dialect_passes_malformed_input_through() {
        assert_eq!(normalize_dialect("{'a': "), r#"{"a": "#);
    }

    proptest! {
        #[test]
        fn property_normalize_dialect_is_idempotent(input in any::<String>()) {
            let once = normalize_dialect(&input);
            prop_assert_eq!(normalize_dialect(&once), once);
        }

        #[test]
        fn property_text_without_marker_is_absent(text in any::<String>()) {
            prop_assume!(!text.contains(DEFAULT_PAYLOAD_MARKER));
            prop_assert_eq!(extract_payload(&text, DEFAULT_PAYLOAD_MARKER), Extraction::Absent);
        }

        #[test]
        fn property_dialect_object_after_marker_parses_as_json(
            prefix in "[A-Za-z0-9 ,.!?]{0,40}",
            fields in prop::collection::btree_map("[a-z_]{1,10}", dialect_value(), 0..8),
        ) {
            let text = format!("{prefix}{DEFAULT_PAYLOAD_MARKER}{}", render_dialect(&fields));
            let extraction = extract_payload(&text, DEFAULT_PAYLOAD_MARKER);
            let candidate = extraction.candidate().expect("marker present");
            let parsed: Value = serde_json::from_str(&normalize_dialect(candidate))
                .expect("normalized payload parses");
            let expected = fields.into_iter().collect::<Map<String, Value>>();
            prop_assert_eq!(parsed, Value::Object(expected));
        }
    }
}
