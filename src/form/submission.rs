//! Final payload handed to the host on submit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::files::FileRecord;
use crate::form::definition::{FieldType, FormConfig};
use crate::form::state::FormState;
use crate::form::value::FieldValue;

/// Key under which file listings are attached when requested.
pub const FILES_KEY: &str = "_files";

/// Error type host callbacks may return.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type SubmitCallback = Box<dyn FnMut(&SubmissionPayload) -> Result<(), CallbackError>>;

pub type CancelCallback = Box<dyn FnMut()>;

/// Signature image entry replacing the marker value of a signature field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Vec<u8>,
    pub format: &'static str,
}

impl SignatureEntry {
    pub fn new(data: Vec<u8>, format: &'static str) -> Self {
        Self {
            kind: "signature",
            data,
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Field(FieldValue),
    Signature(SignatureEntry),
    Files(BTreeMap<String, Vec<FileRecord>>),
}

/// Consolidated submission: field key to submitted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub form_id: String,
    pub submitted_at: DateTime<Utc>,
    pub entries: BTreeMap<String, PayloadValue>,
}

impl SubmissionPayload {
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        match self.entries.get(key) {
            Some(PayloadValue::Field(value)) => Some(value),
            _ => None,
        }
    }

    pub fn signature(&self, key: &str) -> Option<&SignatureEntry> {
        match self.entries.get(key) {
            Some(PayloadValue::Signature(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn files(&self) -> Option<&BTreeMap<String, Vec<FileRecord>>> {
        match self.entries.get(FILES_KEY) {
            Some(PayloadValue::Files(files)) => Some(files),
            _ => None,
        }
    }
}

/// Builds the payload from state. Signature fields always produce an entry,
/// empty when nothing was captured or export failed.
pub fn assemble(config: &FormConfig, state: &FormState, include_files: bool) -> SubmissionPayload {
    let mut entries: BTreeMap<String, PayloadValue> = state
        .values()
        .iter()
        .map(|(key, value)| (key.clone(), PayloadValue::Field(value.clone())))
        .collect();

    for field in config.fields() {
        if !matches!(field.field_type, FieldType::Signature(_)) {
            continue;
        }
        let entry = match state.signature(&field.key) {
            Some(capture) => {
                let data = capture.export().unwrap_or_else(|err| {
                    warn!(field = %field.key, error = %err, "signature export failed");
                    Vec::new()
                });
                SignatureEntry::new(data, capture.export_format())
            }
            None => SignatureEntry::new(Vec::new(), "PNG"),
        };
        entries.insert(field.key.clone(), PayloadValue::Signature(entry));
    }

    if include_files {
        entries.insert(
            FILES_KEY.to_string(),
            PayloadValue::Files(state.all_files().clone()),
        );
    }

    SubmissionPayload {
        form_id: config.id.clone(),
        submitted_at: Utc::now(),
        entries,
    }
}
