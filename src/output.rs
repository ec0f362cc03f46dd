//! JSON text rendering for query values.
//!
//! Rendering is used by `Display for Value` and is handy for logging query
//! results. Record fields are written in their declared order, so a
//! projected record literal prints the way it was written.
//!
//! # Examples
//!
//! ```
//! use table_query::Value;
//! use table_query::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(vec![97, 92, 81]);
//!
//! assert_eq!(to_json(&value), "[97,92,81]");
//! assert_eq!(to_json_pretty(&Value::from(42)), "42");
//! ```

use crate::value::{Record, Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        self.print_value(value, 0)
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) if n.is_finite() => n.to_string(),
            Value::Float(_) => "null".to_string(),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Array(arr) => self.print_array(arr, indent),
            Value::Record(record) => self.print_record(record, indent),
        }
    }

    fn print_array(&self, arr: &[Value], indent: usize) -> String {
        if arr.is_empty() {
            return "[]".to_string();
        }

        let items: Vec<String> = arr
            .iter()
            .map(|v| self.print_value(v, indent + 1))
            .collect();
        self.wrap('[', ']', items, indent)
    }

    fn print_record(&self, record: &Record, indent: usize) -> String {
        if record.is_empty() {
            return "{}".to_string();
        }

        let separator = if self.pretty { ": " } else { ":" };
        let items: Vec<String> = record
            .iter()
            .map(|(key, value)| {
                format!(
                    "\"{}\"{}{}",
                    escape_string(key),
                    separator,
                    self.print_value(value, indent + 1)
                )
            })
            .collect();
        self.wrap('{', '}', items, indent)
    }

    fn wrap(&self, open: char, close: char, items: Vec<String>, indent: usize) -> String {
        if !self.pretty {
            return format!("{}{}{}", open, items.join(","), close);
        }

        let inner = "  ".repeat(indent + 1);
        let mut result = format!("{}\n", open);
        let lines: Vec<String> = items
            .into_iter()
            .map(|item| format!("{}{}", inner, item))
            .collect();
        result.push_str(&lines.join(",\n"));
        result.push('\n');
        result.push_str(&"  ".repeat(indent));
        result.push(close);
        result
    }
}

fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}

/// Renders a value as compact JSON.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Renders a value as JSON with 2-space indentation.
///
/// ```
/// use table_query::{Record, Value};
/// use table_query::output::to_json_pretty;
///
/// let record: Record = [("name", Value::from("Sven")), ("score", Value::from(94))]
///     .into_iter()
///     .collect();
///
/// assert_eq!(
///     to_json_pretty(&Value::Record(record)),
///     "{\n  \"name\": \"Sven\",\n  \"score\": 94\n}"
/// );
/// ```
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}
