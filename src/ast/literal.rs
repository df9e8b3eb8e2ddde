//! Conversion of JSON-like value trees into Python literal syntax.
//!
//! Scalars render inline. Non-empty lists and dicts render one element per
//! line, each element one indentation level deeper than the container, so the
//! output can be pasted at any nesting depth of generated code.

use serde_json::{Map, Number, Value};

/// The indentation unit used by [`to_literal`].
pub const INDENT: &str = "    ";

/// Renders `value` as a Python literal whose closing bracket sits at `indent` levels.
pub fn to_literal(value: &Value, indent: usize) -> String {
    to_literal_with(value, indent, INDENT)
}

/// Like [`to_literal`], with an explicit indentation unit.
pub fn to_literal_with(value: &Value, indent: usize, unit: &str) -> String {
    let mut out = String::new();
    write_literal(&mut out, value, indent, unit);
    out
}

/// Renders a property map as a Python dict literal.
pub fn map_literal(map: &Map<String, Value>, indent: usize, unit: &str) -> String {
    let mut out = String::new();
    write_map(&mut out, map, indent, unit);
    out
}

/// Quotes a string for Python source, escaping backslashes, quotes and control characters.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders a JSON number so that Python parses it back to the same value and type.
///
/// Integers stay integers; floats always carry a fraction or exponent.
pub fn number_literal(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        float_literal(n.as_f64().unwrap_or_default())
    }
}

pub fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "float(\"nan\")".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else {
        // Debug formatting is the shortest round-tripping representation and keeps `.0`.
        format!("{:?}", f)
    }
}

fn write_literal(out: &mut String, value: &Value, indent: usize, unit: &str) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&number_literal(n)),
        Value::String(s) => out.push_str(&quote_string(s)),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(out, indent + 1, unit);
                write_literal(out, item, indent + 1, unit);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, indent, unit);
            out.push(']');
        }
        Value::Object(map) => write_map(out, map, indent, unit),
    }
}

fn write_map(out: &mut String, map: &Map<String, Value>, indent: usize, unit: &str) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    let len = map.len();
    for (i, (key, item)) in map.iter().enumerate() {
        push_indent(out, indent + 1, unit);
        out.push_str(&quote_string(key));
        out.push_str(": ");
        write_literal(out, item, indent + 1, unit);
        if i + 1 < len {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, indent, unit);
    out.push('}');
}

fn push_indent(out: &mut String, level: usize, unit: &str) {
    for _ in 0..level {
        out.push_str(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(to_literal(&Value::Null, 0), "None");
        assert_eq!(to_literal(&json!(true), 0), "True");
        assert_eq!(to_literal(&json!(false), 0), "False");
        assert_eq!(to_literal(&json!(42), 0), "42");
        assert_eq!(to_literal(&json!(-7), 0), "-7");
        assert_eq!(to_literal(&json!(1.5), 0), "1.5");
        assert_eq!(to_literal(&json!(2.0), 0), "2.0");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(quote_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_string(r"C:\data"), r#""C:\\data""#);
        assert_eq!(quote_string("a\nb"), r#""a\nb""#);
        assert_eq!(quote_string("\u{1}"), r#""\x01""#);
        assert_eq!(quote_string("°C"), "\"°C\"");
    }

    #[test]
    fn test_empty_containers_are_compact() {
        assert_eq!(to_literal(&json!([]), 3), "[]");
        assert_eq!(to_literal(&json!({}), 3), "{}");
    }

    #[test]
    fn test_nested_layout() {
        let value = json!({"a": [1, 2], "b": {}});
        let expected = "{\n    \"a\": [\n        1,\n        2\n    ],\n    \"b\": {}\n}";
        assert_eq!(to_literal(&value, 0), expected);
    }

    #[test]
    fn test_indent_offsets_every_line_but_the_first() {
        let value = json!({"k": "v"});
        assert_eq!(to_literal(&value, 1), "{\n        \"k\": \"v\"\n    }");
    }
}
