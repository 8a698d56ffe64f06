use thiserror::Error;

/// Error type for misconfigured forms and failed I/O.
///
/// User-correctable validation problems never surface here; they are kept in
/// [`crate::form::FormState`] as per-field messages.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Step {step} is out of range (form has {steps} steps)")]
    StepOutOfRange { step: usize, steps: usize },
    #[error("Invalid form configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid pattern for field `{key}`: {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("Field `{key}` is not a {expected} field")]
    WrongFieldType { key: String, expected: &'static str },
    #[error("Field `{0}` does not accept image uploads")]
    UploadNotAllowed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Signature export failed: {0}")]
    Export(String),
}

pub type FormResult<T> = Result<T, FormError>;
