use serde_json::Value;

const LABEL_KEY: &str = "label";

/// Flattens any classifier label output into an ordered list of label tokens.
///
/// Accepted shapes: a token, a `{"label": ..}` record, or arrays of either
/// (nested arrays are flattened in order). Scores are dropped. Empty input or
/// a record without a label yields no tokens; any other scalar is stringified.
pub fn normalize_labels(raw: &Value) -> Vec<String> {
    let mut out = Vec::new();
    match raw {
        Value::Object(_) => {
            if let Some(label) = record_label(raw) {
                push_token(&mut out, label);
            }
        }
        other => collect(other, &mut out),
    }
    out
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => push_token(out, s.clone()),
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Object(_) => {
            let token = record_label(value).unwrap_or_else(|| value.to_string());
            push_token(out, token);
        }
        Value::Bool(_) | Value::Number(_) => push_token(out, value.to_string()),
    }
}

fn record_label(record: &Value) -> Option<String> {
    match record.get(LABEL_KEY)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn push_token(out: &mut Vec<String>, token: String) {
    if !token.trim().is_empty() {
        out.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_token_list_keeps_order() {
        let out = normalize_labels(&json!(["LABEL_3", "joy", "LABEL_1"]));
        assert_eq!(out, vec!["LABEL_3", "joy", "LABEL_1"]);
    }

    #[test]
    fn records_drop_scores() {
        let raw = json!([
            {"label": "LABEL_19", "score": 0.91},
            {"label": "fear", "score": 0.42}
        ]);
        assert_eq!(normalize_labels(&raw), vec!["LABEL_19", "fear"]);
    }

    #[test]
    fn single_token_and_single_record() {
        assert_eq!(normalize_labels(&json!("sadness")), vec!["sadness"]);
        assert_eq!(
            normalize_labels(&json!({"label": "LABEL_2", "score": 0.7})),
            vec!["LABEL_2"]
        );
    }

    #[test]
    fn empty_and_unrecognized_shapes_yield_nothing() {
        assert!(normalize_labels(&Value::Null).is_empty());
        assert!(normalize_labels(&json!("")).is_empty());
        assert!(normalize_labels(&json!([])).is_empty());
        assert!(normalize_labels(&json!({"score": 0.3})).is_empty());
    }

    #[test]
    fn nested_pipeline_output_is_flattened() {
        let raw = json!([[{"label": "LABEL_0", "score": 0.1}, {"label": "LABEL_1", "score": 0.8}]]);
        assert_eq!(normalize_labels(&raw), vec!["LABEL_0", "LABEL_1"]);
    }

    #[test]
    fn odd_items_are_stringified() {
        let raw = json!([7, true, {"label": 12}, {"other": 1}, null]);
        assert_eq!(
            normalize_labels(&raw),
            vec!["7", "true", "12", r#"{"other":1}"#]
        );
        assert_eq!(normalize_labels(&json!(0.5)), vec!["0.5"]);
    }
}
