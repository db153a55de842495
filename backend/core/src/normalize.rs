//! Converts whatever shape an agent run produced into a display string.

use serde_json::Value;

/// Normalize agent output into a single string.
///
/// Strings pass through unchanged. A list of content blocks is flattened by joining
/// every block's `text` field with a blank line; blocks without `text` are skipped.
/// Anything else, including a list with no text at all, falls back to its JSON
/// rendering so the caller never receives a silently empty answer.
pub fn normalize_output(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => {
            let texts: Vec<String> = blocks
                .iter()
                .filter_map(|block| match block.get("text")? {
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            if texts.is_empty() {
                output.to_string()
            } else {
                texts.join("\n\n")
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_passes_through() {
        assert_eq!(normalize_output(&json!("hello")), "hello");
        assert_eq!(normalize_output(&json!("")), "");
    }

    #[test]
    fn test_blocks_joined_with_blank_line() {
        let out = normalize_output(&json!([{ "text": "a" }, { "text": "b" }]));
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn test_blocks_without_text_are_skipped() {
        let out = normalize_output(&json!([
            { "type": "text", "text": "Here is your requested data.." },
            { "type": "tool_use", "id": "t1" },
            "bare string",
            { "type": "text", "text": "- total: 42.00" }
        ]));
        assert_eq!(out, "Here is your requested data..\n\n- total: 42.00");
    }

    #[test]
    fn test_textless_list_falls_back_to_json() {
        let out = normalize_output(&json!([{ "x": 1 }]));
        assert!(!out.is_empty());
        assert_eq!(out, r#"[{"x":1}]"#);
    }

    #[test]
    fn test_other_shapes_stringify() {
        assert_eq!(normalize_output(&json!({ "output": 3 })), r#"{"output":3}"#);
        assert_eq!(normalize_output(&json!(7)), "7");
        assert_eq!(normalize_output(&Value::Null), "null");
    }
}
