use std::collections::BTreeMap;

use crate::files::FileRecord;
use crate::form::definition::{FieldType, FormConfig};
use crate::form::value::FieldValue;
use crate::signature::SignatureCapture;

/// Mutable record of one in-progress form session.
///
/// Owned by [`FormController`](crate::form::FormController); mutation goes
/// through the controller so that validation, touch tracking and the redraw
/// signal stay consistent.
#[derive(Debug, Clone)]
pub struct FormState {
    pub(crate) current_step: usize,
    pub(crate) values: BTreeMap<String, FieldValue>,
    pub(crate) errors: BTreeMap<String, String>,
    pub(crate) touched: BTreeMap<String, bool>,
    pub(crate) is_submitting: bool,
    pub(crate) files: BTreeMap<String, Vec<FileRecord>>,
    pub(crate) signature_data: BTreeMap<String, SignatureCapture>,
}

impl FormState {
    /// Fresh state: first step, defaults applied, nothing touched.
    pub fn initial(config: &FormConfig) -> Self {
        let mut values = BTreeMap::new();
        let mut signature_data = BTreeMap::new();
        for field in config.fields() {
            values.insert(field.key.clone(), field.initial_value());
            if let FieldType::Signature(options) = &field.field_type {
                signature_data.insert(field.key.clone(), SignatureCapture::new(options.clone()));
            }
        }
        Self {
            current_step: 0,
            values,
            errors: BTreeMap::new(),
            touched: BTreeMap::new(),
            is_submitting: false,
            files: BTreeMap::new(),
            signature_data,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Every current error, shown or not.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// The error to display for `key`: only once the field has been touched.
    pub fn visible_error(&self, key: &str) -> Option<&str> {
        if self.is_touched(key) {
            self.error(key)
        } else {
            None
        }
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.touched.get(key).copied().unwrap_or(false)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn all_files(&self) -> &BTreeMap<String, Vec<FileRecord>> {
        &self.files
    }

    pub fn files(&self, key: &str) -> &[FileRecord] {
        self.files.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn signature(&self, key: &str) -> Option<&SignatureCapture> {
        self.signature_data.get(key)
    }

    pub(crate) fn touch(&mut self, key: &str) {
        self.touched.insert(key.to_string(), true);
    }

    pub(crate) fn record_error(&mut self, key: &str, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(key.to_string(), message);
            }
            None => {
                self.errors.remove(key);
            }
        }
    }
}
