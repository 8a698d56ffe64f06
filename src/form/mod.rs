//! Multi-step form engine: definitions, values, session state, the
//! controller that drives them, and submission assembly.

pub mod controller;
pub mod definition;
pub mod state;
pub mod submission;
pub mod value;

pub use controller::{
    FormController, NavigationOutcome, StepStatus, StepSummary, SubmitOutcome, UploadOutcome,
};
pub use definition::{
    CustomValidator, FieldDefinition, FieldType, FileOptions, FormConfig, Pattern,
    SectionDefinition, SignatureOptions, ValidationRules,
};
pub use state::FormState;
pub use submission::{PayloadValue, SignatureEntry, SubmissionPayload};
pub use value::FieldValue;
