//! Core value type for template evaluation

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Core value type for template evaluation
///
/// Every node evaluation and helper invocation produces a `TemplateValue`.
/// The enum is closed: collaborator-supplied data enters through the
/// `From<serde_json::Value>` conversion, so dotted-path resolution only ever
/// has to understand keys and indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    /// Absent value; renders as the empty string
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value (64-bit signed)
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Ordered list of values
    Array(Vec<TemplateValue>),
    /// Keyed collection; insertion order is significant for reproducible output
    Object(IndexMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Name of the value's type, used in error messages and argument binding
    pub fn type_name(&self) -> &'static str {
        match self {
            TemplateValue::Null => "null",
            TemplateValue::Boolean(_) => "boolean",
            TemplateValue::Integer(_) => "integer",
            TemplateValue::Float(_) => "float",
            TemplateValue::String(_) => "string",
            TemplateValue::Array(_) => "array",
            TemplateValue::Object(_) => "object",
        }
    }

    /// True if the value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, TemplateValue::Null)
    }

    /// Loose truthiness used by conditions and the boolean evaluator
    ///
    /// Empty strings, the literal strings `"false"` and `"0"`, zero numbers,
    /// empty collections and `Null` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Boolean(b) => *b,
            TemplateValue::Integer(i) => *i != 0,
            TemplateValue::Float(f) => *f != 0.0,
            TemplateValue::String(s) => {
                !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false")
            }
            TemplateValue::Array(items) => !items.is_empty(),
            TemplateValue::Object(entries) => !entries.is_empty(),
        }
    }

    /// Numeric view of the value, if one exists
    ///
    /// Strings are parsed; `Null` is absent, not zero, so callers decide how
    /// missing operands behave.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TemplateValue::Integer(i) => Some(*i as f64),
            TemplateValue::Float(f) => Some(*f),
            TemplateValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            TemplateValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Integer view of the value, if one exists without loss
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TemplateValue::Integer(i) => Some(*i),
            TemplateValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            TemplateValue::Boolean(b) => Some(if *b { 1 } else { 0 }),
            TemplateValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Borrow the string content, when the value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TemplateValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number of elements for collection values, `None` otherwise
    pub fn len(&self) -> Option<usize> {
        match self {
            TemplateValue::Array(items) => Some(items.len()),
            TemplateValue::Object(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Iterate a collection value as (key, value) pairs
    ///
    /// Arrays yield stringified indices as keys so loop helpers can expose a
    /// key variable uniformly.
    pub fn iter_entries(&self) -> Vec<(String, TemplateValue)> {
        match self {
            TemplateValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            TemplateValue::Object(entries) => entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Loose equality with numeric coercion, mirroring the comparison rules
    /// of the boolean evaluator
    pub fn loose_equals(&self, other: &TemplateValue) -> bool {
        if self == other {
            return true;
        }
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (TemplateValue::Null, TemplateValue::String(s))
                | (TemplateValue::String(s), TemplateValue::Null) => s.is_empty(),
                _ => false,
            },
        }
    }

    /// Loose ordering; numbers compare numerically, strings lexically
    pub fn loose_cmp(&self, other: &TemplateValue) -> Option<std::cmp::Ordering> {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => match (self, other) {
                (TemplateValue::String(a), TemplateValue::String(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    /// Render the value into its output string form
    ///
    /// `Null` renders empty, booleans render as `1`/empty (so a printed
    /// condition concatenates cleanly), floats drop a zero fraction.
    pub fn render_string(&self) -> String {
        match self {
            TemplateValue::Null => String::new(),
            TemplateValue::Boolean(true) => "1".to_string(),
            TemplateValue::Boolean(false) => String::new(),
            TemplateValue::Integer(i) => i.to_string(),
            TemplateValue::Float(f) => format_float(*f),
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Array(items) => items
                .iter()
                .map(TemplateValue::render_string)
                .collect::<Vec<_>>()
                .join(","),
            TemplateValue::Object(entries) => entries
                .values()
                .map(TemplateValue::render_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Floats with a zero fraction print without it: `2.0` renders as `2`
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_string())
    }
}

impl Default for TemplateValue {
    fn default() -> Self {
        TemplateValue::Null
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Boolean(b)
    }
}

impl From<i64> for TemplateValue {
    fn from(i: i64) -> Self {
        TemplateValue::Integer(i)
    }
}

impl From<i32> for TemplateValue {
    fn from(i: i32) -> Self {
        TemplateValue::Integer(i as i64)
    }
}

impl From<usize> for TemplateValue {
    fn from(i: usize) -> Self {
        TemplateValue::Integer(i as i64)
    }
}

impl From<f64> for TemplateValue {
    fn from(f: f64) -> Self {
        TemplateValue::Float(f)
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<Vec<TemplateValue>> for TemplateValue {
    fn from(items: Vec<TemplateValue>) -> Self {
        TemplateValue::Array(items)
    }
}

impl From<IndexMap<String, TemplateValue>> for TemplateValue {
    fn from(entries: IndexMap<String, TemplateValue>) -> Self {
        TemplateValue::Object(entries)
    }
}

impl From<JsonValue> for TemplateValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => TemplateValue::Null,
            JsonValue::Bool(b) => TemplateValue::Boolean(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    TemplateValue::Integer(i)
                } else {
                    TemplateValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => TemplateValue::String(s),
            JsonValue::Array(items) => {
                TemplateValue::Array(items.into_iter().map(TemplateValue::from).collect())
            }
            JsonValue::Object(entries) => TemplateValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(!TemplateValue::Null.is_truthy());
        assert!(!TemplateValue::from("").is_truthy());
        assert!(!TemplateValue::from("0").is_truthy());
        assert!(!TemplateValue::from("false").is_truthy());
        assert!(!TemplateValue::Integer(0).is_truthy());
        assert!(TemplateValue::from("no").is_truthy());
        assert!(TemplateValue::Integer(-1).is_truthy());
        assert!(TemplateValue::Float(0.5).is_truthy());
    }

    #[test]
    fn render_string_drops_zero_fraction() {
        assert_eq!(TemplateValue::Float(2.0).render_string(), "2");
        assert_eq!(TemplateValue::Float(2.5).render_string(), "2.5");
        assert_eq!(TemplateValue::Integer(7).render_string(), "7");
        assert_eq!(TemplateValue::Null.render_string(), "");
    }

    #[test]
    fn loose_equality_coerces_numeric_strings() {
        assert!(TemplateValue::from("4").loose_equals(&TemplateValue::Integer(4)));
        assert!(TemplateValue::Float(1.0).loose_equals(&TemplateValue::Integer(1)));
        assert!(!TemplateValue::from("a").loose_equals(&TemplateValue::Integer(1)));
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let json = serde_json::json!({"user": {"name": "Ada", "tags": ["a", "b"], "age": 36}});
        let value = TemplateValue::from(json);
        let TemplateValue::Object(entries) = &value else {
            panic!("expected object");
        };
        let TemplateValue::Object(user) = &entries["user"] else {
            panic!("expected nested object");
        };
        assert_eq!(user["name"], TemplateValue::from("Ada"));
        assert_eq!(user["age"], TemplateValue::Integer(36));
    }
}
