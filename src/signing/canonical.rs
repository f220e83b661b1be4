//! Canonical JSON serialization.
//!
//! Byte-identical output for equivalent inputs: object keys are sorted
//! recursively, arrays keep positional order, and no whitespace is emitted
//! between tokens. This is the form all signatures are computed over.

use serde_json::Value;

/// Serialize a JSON value in canonical form.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                // Key came from the map, so the entry exists.
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_recursively() {
        let value = json!({"zeta": {"b": 1, "a": 2}, "alpha": [3, {"y": 0, "x": 1}]});
        assert_eq!(
            canonical_json(&value),
            r#"{"alpha":[3,{"x":1,"y":0}],"zeta":{"a":2,"b":1}}"#
        );
    }

    #[test]
    fn arrays_keep_positional_order() {
        let value = json!(["c", "a", "b"]);
        assert_eq!(canonical_json(&value), r#"["c","a","b"]"#);
    }

    #[test]
    fn escapes_control_characters() {
        let value = json!({"msg": "line\nbreak\ttab \u{01} done"});
        assert_eq!(
            canonical_json(&value),
            "{\"msg\":\"line\\nbreak\\ttab \\u0001 done\"}"
        );
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let value = json!({"b": [1, 2.5, null, true], "a": {"nested": "x"}});
        let once = canonical_json(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        assert_eq!(canonical_json(&reparsed), once);
    }

    #[test]
    fn no_whitespace_between_tokens() {
        let value = json!({"a": [1, 2], "b": "c"});
        let out = canonical_json(&value);
        assert!(!out.contains(' '));
    }
}
