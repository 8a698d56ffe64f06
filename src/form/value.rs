use std::fmt;

use serde::{Deserialize, Serialize};

/// Value reported for a signature field once something has been drawn.
pub const SIGNATURE_DRAWN: &str = "signature_drawn";

/// Prefix of the value reported for a signature field backed by an upload.
pub const SIGNATURE_UPLOADED_PREFIX: &str = "file_uploaded:";

/// Current value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn uploaded_signature(file_name: &str) -> Self {
        FieldValue::Text(format!("{SIGNATURE_UPLOADED_PREFIX}{file_name}"))
    }

    /// Empty strings and whitespace-only strings count as "no value".
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(flag) => *flag,
            FieldValue::Number(number) => *number != 0.0,
            FieldValue::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::empty()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_counts_as_blank() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from(" a ").is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
    }

    #[test]
    fn untagged_json_keeps_scalar_types() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[true, 3.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Number(3.5),
                FieldValue::from("x")
            ]
        );
    }
}
