//! Normalizes the dialog engine's raw trace array.
//!
//! The engine's reply is a heterogeneous array of discriminated trace
//! objects whose schema has drifted across versions, so everything here
//! probes `serde_json::Value` through prioritized fallback chains and
//! defaults to empty rather than failing.

use serde_json::Value;

/// A choice offered by the engine. `label` is displayed; `value` is echoed
/// back as the next user turn when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub value: String,
}

/// Flat view of one turn's traces: display texts in order, then every
/// choice button in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTurn {
    pub messages: Vec<String>,
    pub buttons: Vec<Button>,
}

/// Flatten a raw trace array. Non-array input, unknown trace types, and
/// malformed payloads all normalize to nothing.
pub fn normalize_traces(raw: &Value) -> NormalizedTurn {
    let mut turn = NormalizedTurn::default();
    let Some(traces) = raw.as_array() else {
        return turn;
    };
    for trace in traces {
        let payload = trace.get("payload").unwrap_or(&Value::Null);
        match trace.get("type").and_then(Value::as_str) {
            Some("text") | Some("speak") => {
                if let Some(text) = message_text(payload) {
                    turn.messages.push(text.to_string());
                }
            }
            Some("choice") => collect_buttons(payload, &mut turn.buttons),
            _ => {}
        }
    }
    turn
}

fn message_text(payload: &Value) -> Option<&str> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
}

/// The button list has lived under more than one payload field across
/// engine versions; take the first one that is actually an array.
fn collect_buttons(payload: &Value, out: &mut Vec<Button>) {
    let entries = ["buttons", "choices"]
        .iter()
        .find_map(|field| payload.get(field).and_then(Value::as_array));
    let Some(entries) = entries else { return };
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        let request_label = entry
            .pointer("/request/payload/label")
            .and_then(Value::as_str);
        let label = name.or(request_label);
        let value = request_label.or(name);
        if let (Some(label), Some(value)) = (label, value) {
            out.push(Button {
                label: label.to_string(),
                value: value.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_array_normalizes_to_nothing() {
        let turn = normalize_traces(&json!([]));
        assert!(turn.messages.is_empty());
        assert!(turn.buttons.is_empty());
    }

    #[test]
    fn non_array_input_normalizes_to_nothing() {
        for raw in [json!(null), json!("traces"), json!({"type": "text"})] {
            assert_eq!(normalize_traces(&raw), NormalizedTurn::default());
        }
    }

    #[test]
    fn text_and_speak_traces_contribute_in_order() {
        let raw = json!([
            {"type": "speak", "payload": {"message": "Hello!"}},
            {"type": "debug", "payload": {"message": "ignored"}},
            {"type": "text", "payload": {"message": "How can I help?"}},
        ]);
        let turn = normalize_traces(&raw);
        assert_eq!(turn.messages, vec!["Hello!", "How can I help?"]);
    }

    #[test]
    fn message_field_falls_back_to_text() {
        let raw = json!([{"type": "text", "payload": {"text": "fallback field"}}]);
        let turn = normalize_traces(&raw);
        assert_eq!(turn.messages, vec!["fallback field"]);
    }

    #[test]
    fn name_used_for_both_label_and_value_when_no_request_label() {
        let raw = json!([
            {"type": "choice", "payload": {"buttons": [{"name": "Yes"}]}}
        ]);
        let turn = normalize_traces(&raw);
        assert_eq!(
            turn.buttons,
            vec![Button {
                label: "Yes".into(),
                value: "Yes".into()
            }]
        );
    }

    #[test]
    fn request_label_wins_for_value_and_backs_up_label() {
        let raw = json!([
            {"type": "choice", "payload": {"buttons": [
                {"name": "Grammar", "request": {"payload": {"label": "grammar_help"}}},
                {"request": {"payload": {"label": "Writing"}}},
            ]}}
        ]);
        let turn = normalize_traces(&raw);
        assert_eq!(
            turn.buttons,
            vec![
                Button {
                    label: "Grammar".into(),
                    value: "grammar_help".into()
                },
                Button {
                    label: "Writing".into(),
                    value: "Writing".into()
                },
            ]
        );
    }

    #[test]
    fn historical_choices_field_name_is_accepted() {
        let raw = json!([
            {"type": "choice", "payload": {"choices": [{"name": "Old shape"}]}}
        ]);
        let turn = normalize_traces(&raw);
        assert_eq!(turn.buttons.len(), 1);
        assert_eq!(turn.buttons[0].label, "Old shape");
    }

    #[test]
    fn buttons_from_multiple_choice_traces_keep_encounter_order() {
        let raw = json!([
            {"type": "choice", "payload": {"buttons": [{"name": "A"}, {"name": "B"}]}},
            {"type": "text", "payload": {"message": "pick one"}},
            {"type": "choice", "payload": {"buttons": [{"name": "C"}]}},
        ]);
        let turn = normalize_traces(&raw);
        let labels: Vec<_> = turn.buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(turn.messages, vec!["pick one"]);
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let raw = json!([
            {"type": "choice"},
            {"type": "choice", "payload": {}},
            {"type": "choice", "payload": {"buttons": "not-an-array"}},
            {"type": "choice", "payload": {"buttons": [{}, {"name": "Kept"}]}},
            {"type": "text", "payload": {}},
            {"payload": {"message": "no type"}},
        ]);
        let turn = normalize_traces(&raw);
        assert_eq!(turn.buttons.len(), 1);
        assert_eq!(turn.buttons[0].label, "Kept");
        assert!(turn.messages.is_empty());
    }
}
