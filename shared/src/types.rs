//! Common types used across the platform

use serde::{Deserialize, Deserializer, Serialize};

/// A raw field value as the evaluations API sends it.
///
/// Field sheets are typed in by hand, so the same column may arrive as a
/// JSON number, a numeric string or an empty string. The raw shape is kept
/// so that "missing" and "zero" stay distinguishable. Any other shape
/// (booleans, objects, arrays) lands in `Other` and counts as nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Numeric value of the field; unparseable text counts as 0
    pub fn as_count(&self) -> f64 {
        match self {
            FieldValue::Number(n) if n.is_finite() => *n,
            FieldValue::Number(_) => 0.0,
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            FieldValue::Other(_) => 0.0,
        }
    }

    /// Whether the field holds an actual entry (any number, or non-blank text)
    pub fn is_recorded(&self) -> bool {
        match self {
            FieldValue::Number(_) => true,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Other(_) => false,
        }
    }

    /// Text rendering used by exports and grouping keys
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Other(_) => String::new(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Sum contribution of an optional field (absent counts as 0)
pub fn count_of(field: &Option<FieldValue>) -> f64 {
    field.as_ref().map(FieldValue::as_count).unwrap_or(0.0)
}

/// Whether an optional field holds an actual entry
pub fn is_recorded(field: &Option<FieldValue>) -> bool {
    field.as_ref().map(FieldValue::is_recorded).unwrap_or(false)
}

/// Render a number without a trailing `.0` when it is integral
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Deserialize an identifier that may arrive as a number or a string
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_text()).unwrap_or_default())
}

/// Deserialize an optional free-text field that may arrive as a number
pub fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FieldValue>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_text()))
}
