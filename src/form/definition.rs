//! Declarative description of a multi-step form.
//!
//! Definitions are plain data: they can be built in code with the builder
//! helpers or loaded from a JSON document. Unknown keys are rejected at load
//! time and [`FormConfig::verify`] checks the structural invariants before a
//! controller is created.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{FormError, FormResult};
use crate::form::value::FieldValue;
use crate::signature::Color;

const DEFAULT_SIGNATURE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "bmp"];
const DEFAULT_SIGNATURE_MAX_BYTES: u64 = 5 * 1024 * 1024;

type ValidatorCallback = dyn Fn(&FieldValue) -> Option<String> + Send + Sync;

/// Caller-supplied validation hook, invoked after every built-in rule.
#[derive(Clone)]
pub struct CustomValidator(Arc<ValidatorCallback>);

impl CustomValidator {
    pub fn new(func: impl Fn(&FieldValue) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(func))
    }

    pub fn call(&self, value: &FieldValue) -> Option<String> {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

/// Regular expression constraint, anchored at both ends of the value.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pattern::new(value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(source).map_err(serde::de::Error::custom)
    }
}

/// Optional per-field validation rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    /// Replaces the generic "Invalid format" message on pattern mismatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
    #[serde(skip)]
    pub custom_validator: Option<CustomValidator>,
}

/// Upload constraints for `file` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// Lowercase extensions without the leading dot. `None` accepts anything.
    pub allowed_extensions: Option<BTreeSet<String>>,
    pub max_file_size: Option<u64>,
    pub multiple: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            allowed_extensions: None,
            max_file_size: None,
            multiple: true,
        }
    }
}

/// Canvas and upload settings for `signature` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureOptions {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub allow_image_upload: bool,
    pub allowed_extensions: BTreeSet<String>,
    pub max_file_size: u64,
    pub stroke_width: f32,
    pub stroke_color: Color,
    pub background_color: Color,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            canvas_width: 300,
            canvas_height: 120,
            allow_image_upload: true,
            allowed_extensions: DEFAULT_SIGNATURE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_file_size: DEFAULT_SIGNATURE_MAX_BYTES,
            stroke_width: 2.0,
            stroke_color: Color::BLACK,
            background_color: Color::WHITE,
        }
    }
}

/// Field type, carrying the options that only make sense for that type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Textarea,
    Checkbox,
    File(FileOptions),
    Signature(SignatureOptions),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Checkbox => "checkbox",
            FieldType::File(_) => "file",
            FieldType::Signature(_) => "signature",
        }
    }

    /// Value a fresh form starts with when no default is configured.
    pub fn initial_value(&self) -> FieldValue {
        match self {
            FieldType::Checkbox => FieldValue::Bool(false),
            FieldType::Number => FieldValue::Number(0.0),
            _ => FieldValue::empty(),
        }
    }

    /// Whether the field carries free text subject to length and pattern rules.
    pub fn is_textual(&self) -> bool {
        !matches!(
            self,
            FieldType::Checkbox | FieldType::File(_) | FieldType::Signature(_)
        )
    }
}

/// Declarative description of a single form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

impl FieldDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            disabled: false,
            placeholder: None,
            default_value: None,
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    pub fn with_custom_validator(
        mut self,
        func: impl Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        let mut rules = self.validation.take().unwrap_or_default();
        rules.custom_validator = Some(CustomValidator::new(func));
        self.validation = Some(rules);
        self
    }

    /// Adds a full-match pattern rule, with an optional message replacing
    /// "Invalid format".
    pub fn with_pattern(mut self, source: &str, message: Option<&str>) -> FormResult<Self> {
        let pattern = Pattern::new(source).map_err(|source| FormError::InvalidPattern {
            key: self.key.clone(),
            source,
        })?;
        let mut rules = self.validation.take().unwrap_or_default();
        rules.pattern = Some(pattern);
        rules.message = message.map(str::to_owned);
        self.validation = Some(rules);
        Ok(self)
    }

    pub fn initial_value(&self) -> FieldValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.field_type.initial_value())
    }

    pub fn rules(&self) -> Option<&ValidationRules> {
        self.validation.as_ref()
    }

    pub fn file_options(&self) -> Option<&FileOptions> {
        match &self.field_type {
            FieldType::File(options) => Some(options),
            _ => None,
        }
    }

    pub fn signature_options(&self) -> Option<&SignatureOptions> {
        match &self.field_type {
            FieldType::Signature(options) => Some(options),
            _ => None,
        }
    }

    /// Extension and size limits applied to attached files, if any.
    pub fn upload_limits(&self) -> (Option<&BTreeSet<String>>, Option<u64>) {
        match &self.field_type {
            FieldType::File(options) => {
                (options.allowed_extensions.as_ref(), options.max_file_size)
            }
            FieldType::Signature(options) => {
                (Some(&options.allowed_extensions), Some(options.max_file_size))
            }
            _ => (None, None),
        }
    }
}

/// An ordered step of the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionDefinition {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl SectionDefinition {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            description: None,
            fields,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn default_submit_text() -> String {
    "Submit".into()
}

fn default_cancel_text() -> String {
    "Cancel".into()
}

/// Complete form definition; section order is step order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<SectionDefinition>,
    #[serde(default = "default_submit_text")]
    pub submit_text: String,
    #[serde(default = "default_cancel_text")]
    pub cancel_text: String,
}

impl FormConfig {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        sections: Vec<SectionDefinition>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            sections,
            submit_text: default_submit_text(),
            cancel_text: default_cancel_text(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_json_str(json: &str) -> FormResult<Self> {
        let config: FormConfig = serde_json::from_str(json)?;
        config.verify()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> FormResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// The application form bundled with the crate.
    pub fn nic_application() -> FormResult<Self> {
        Self::from_json_str(include_str!("../../forms/nic_application.json"))
    }

    /// Checks the structural invariants: at least one section, no empty
    /// section, unique field keys across the whole form, and a drawable
    /// canvas for every signature field.
    pub fn verify(&self) -> FormResult<()> {
        if self.sections.is_empty() {
            return Err(FormError::InvalidConfig(format!(
                "form `{}` has no sections",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.fields.is_empty() {
                return Err(FormError::InvalidConfig(format!(
                    "section `{}` has no fields",
                    section.key
                )));
            }
            for field in &section.fields {
                if !seen.insert(field.key.as_str()) {
                    return Err(FormError::InvalidConfig(format!(
                        "duplicate field key `{}`",
                        field.key
                    )));
                }
                if let Some(options) = field.signature_options() {
                    if options.canvas_width == 0 || options.canvas_height == 0 {
                        return Err(FormError::InvalidConfig(format!(
                            "signature field `{}` has an empty canvas ({}x{})",
                            field.key, options.canvas_width, options.canvas_height
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn step_count(&self) -> usize {
        self.sections.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.key == key)
    }

    /// Index of the section that owns `key`.
    pub fn step_of(&self, key: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.fields.iter().any(|field| field.key == key))
    }
}
