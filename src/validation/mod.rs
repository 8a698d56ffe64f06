//! Field-level and form-level validation.
//!
//! Rules run in a fixed order and stop at the first failure: required-ness,
//! the empty-optional shortcut, type checks, string length and pattern,
//! attachment checks, and finally the caller's custom validator.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::files::FileRecord;
use crate::form::definition::{FieldDefinition, FieldType, ValidationRules};
use crate::form::value::FieldValue;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Validates one field. Returns the error message, or `None` when valid.
///
/// `files` are the attachments currently recorded for this field.
pub fn validate_field(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
    files: &[FileRecord],
) -> Option<String> {
    let rules = field.rules();

    if let Some(error) = check_required(field, value, files) {
        return Some(error);
    }

    let blank = FieldValue::empty();
    let value = match value {
        Some(value) if !value.is_blank() => value,
        _ if field.field_type.is_textual() => return None,
        Some(value) => value,
        None => &blank,
    };

    if let Some(error) = check_type(field, value, rules) {
        return Some(error);
    }

    if field.field_type.is_textual() {
        if let (Some(rules), FieldValue::Text(text)) = (rules, value) {
            if let Some(error) = check_text(text, rules) {
                return Some(error);
            }
        }
    }

    if let Some(error) = check_attachments(field, files) {
        return Some(error);
    }

    rules
        .and_then(|rules| rules.custom_validator.as_ref())
        .and_then(|validator| validator.call(value))
        .filter(|message| !message.is_empty())
}

/// Validates every field independently and collects the failures by key.
pub fn validate_form<'a>(
    fields: impl IntoIterator<Item = &'a FieldDefinition>,
    values: &BTreeMap<String, FieldValue>,
    files: &BTreeMap<String, Vec<FileRecord>>,
) -> BTreeMap<String, String> {
    fields
        .into_iter()
        .filter_map(|field| {
            let attached = files.get(&field.key).map(Vec::as_slice).unwrap_or(&[]);
            validate_field(field, values.get(&field.key), attached)
                .map(|error| (field.key.clone(), error))
        })
        .collect()
}

fn required_message(field: &FieldDefinition) -> String {
    format!("{} is required", field.label)
}

fn check_required(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
    files: &[FileRecord],
) -> Option<String> {
    if !field.required {
        return None;
    }
    let satisfied = match &field.field_type {
        FieldType::Checkbox => value.is_some_and(FieldValue::is_truthy),
        FieldType::File(_) => !files.is_empty(),
        FieldType::Signature(_) => {
            let drawn = value.is_some_and(|value| !value.is_blank());
            drawn || !files.is_empty()
        }
        _ => value.is_some_and(|value| !value.is_blank()),
    };
    if satisfied {
        None
    } else {
        Some(required_message(field))
    }
}

fn check_type(
    field: &FieldDefinition,
    value: &FieldValue,
    rules: Option<&ValidationRules>,
) -> Option<String> {
    match &field.field_type {
        FieldType::Email => {
            let text = value.to_string();
            if EMAIL_PATTERN.is_match(text.trim()) {
                None
            } else {
                Some("Please enter a valid email address".into())
            }
        }
        FieldType::Number => {
            let number = match value {
                FieldValue::Number(number) => *number,
                FieldValue::Text(text) => match text.trim().parse::<f64>() {
                    Ok(number) if number.is_finite() => number,
                    _ => return Some("Please enter a valid number".into()),
                },
                FieldValue::Bool(_) => return Some("Please enter a valid number".into()),
            };
            let rules = rules?;
            if let Some(min) = rules.min.filter(|min| number < *min) {
                return Some(format!("Value must be at least {}", min));
            }
            if let Some(max) = rules.max.filter(|max| number > *max) {
                return Some(format!("Value must be at most {}", max));
            }
            None
        }
        FieldType::Password => match (rules, value) {
            (Some(rules), FieldValue::Text(text)) => check_password(text, rules),
            _ => None,
        },
        _ => None,
    }
}

fn check_password(text: &str, rules: &ValidationRules) -> Option<String> {
    if rules.require_uppercase && !text.chars().any(char::is_uppercase) {
        return Some("Must contain an uppercase letter".into());
    }
    if rules.require_lowercase && !text.chars().any(char::is_lowercase) {
        return Some("Must contain a lowercase letter".into());
    }
    if rules.require_digit && !text.chars().any(|c| c.is_ascii_digit()) {
        return Some("Must contain a digit".into());
    }
    if rules.require_special
        && !text
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return Some("Must contain a special character".into());
    }
    None
}

fn check_text(text: &str, rules: &ValidationRules) -> Option<String> {
    let length = text.trim().chars().count();
    if let Some(min) = rules.min_length.filter(|min| length < *min) {
        return Some(format!("Must be at least {} characters", min));
    }
    if let Some(max) = rules.max_length.filter(|max| length > *max) {
        return Some(format!("Must be at most {} characters", max));
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_full_match(text) {
            return Some(
                rules
                    .message
                    .clone()
                    .unwrap_or_else(|| "Invalid format".into()),
            );
        }
    }
    None
}

fn check_attachments(field: &FieldDefinition, files: &[FileRecord]) -> Option<String> {
    let (allowed, max_size) = field.upload_limits();
    let noun = match field.field_type {
        FieldType::Signature(_) => "Image",
        _ => "File",
    };
    for file in files {
        if let Some(allowed) = allowed {
            if !extension_allowed(allowed, &file.extension()) {
                return Some(format!(
                    "{} type not allowed. Allowed types: {}",
                    noun,
                    join_extensions(allowed)
                ));
            }
        }
        if let Some(max) = max_size.filter(|max| file.size > *max) {
            return Some(format!(
                "File too large: {} is {:.1}MB (max: {:.1}MB)",
                file.name,
                file.size as f64 / BYTES_PER_MB,
                max as f64 / BYTES_PER_MB
            ));
        }
    }
    None
}

pub(crate) fn extension_allowed(allowed: &BTreeSet<String>, extension: &str) -> bool {
    allowed
        .iter()
        .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(extension))
}

pub(crate) fn join_extensions(allowed: &BTreeSet<String>) -> String {
    allowed.iter().cloned().collect::<Vec<_>>().join(", ")
}
