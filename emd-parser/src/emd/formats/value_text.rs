//! Text forms of field values
//!
//! The inverse of the scanner's `scan_*` readers. Floats use Rust's shortest
//! representation that reads back to the same `f32` (`0.2`, `110`, `-4.5`).

use crate::emd::field::Field;
use crate::emd::value::Value;

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

pub fn format_float(value: f32) -> String {
    value.to_string()
}

/// Quotes `text`, escaping what the scanner would otherwise misread.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => format_bool(*b).to_string(),
        Value::Integer(i) => i.to_string(),
        Value::UInteger(u) => u.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote(s),
    }
}

/// Space-separated values, as for one vector or color.
pub fn format_values(values: &[Value]) -> String {
    values
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The value text of a primitive field: the values of a single element, or
/// `[a, b, ...]` for a list. `None` for object-valued fields.
pub fn format_field(field: &Field) -> Option<String> {
    let spec = field.spec();
    if spec.value_type.is_object() {
        return None;
    }
    let values = field.values();
    if !spec.is_list {
        return Some(format_values(values));
    }
    let elements: Vec<String> = values
        .chunks(spec.count.max(1))
        .map(format_values)
        .collect();
    Some(format!("[{}]", elements.join(", ")))
}
