#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use slnic_bridge::files::RetryPolicy;
use slnic_bridge::form::{
    FieldDefinition, FieldType, FileOptions, FormConfig, FormController, SectionDefinition,
    SignatureOptions, ValidationRules,
};
use slnic_bridge::signature::rasterize_png;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_dir() -> std::path::PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn extensions(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|ext| ext.to_string()).collect()
}

/// Three steps: personal details, documents, declaration.
pub fn sample_form() -> FormConfig {
    FormConfig::new(
        "sample",
        "Sample Application",
        vec![
            SectionDefinition::new(
                "personal",
                "Personal",
                vec![
                    FieldDefinition::new("name", "Name", FieldType::Text)
                        .required()
                        .with_validation(ValidationRules {
                            min_length: Some(2),
                            ..ValidationRules::default()
                        }),
                    FieldDefinition::new("email", "Email", FieldType::Email).required(),
                    FieldDefinition::new("age", "Age", FieldType::Number)
                        .required()
                        .with_validation(ValidationRules {
                            min: Some(18.0),
                            max: Some(65.0),
                            ..ValidationRules::default()
                        }),
                ],
            ),
            SectionDefinition::new(
                "documents",
                "Documents",
                vec![
                    FieldDefinition::new(
                        "certificate",
                        "Certificate",
                        FieldType::File(FileOptions {
                            allowed_extensions: Some(extensions(&["pdf", "jpg"])),
                            max_file_size: Some(1024 * 1024),
                            multiple: false,
                        }),
                    )
                    .required(),
                    FieldDefinition::new(
                        "extras",
                        "Extras",
                        FieldType::File(FileOptions::default()),
                    ),
                ],
            ),
            SectionDefinition::new(
                "declaration",
                "Declaration",
                vec![
                    FieldDefinition::new("agree", "Agreement", FieldType::Checkbox).required(),
                    FieldDefinition::new(
                        "signature",
                        "Signature",
                        FieldType::Signature(SignatureOptions::default()),
                    )
                    .required(),
                ],
            ),
        ],
    )
}

/// Controller over [`sample_form`] with a fast retry policy.
pub fn sample_controller() -> FormController {
    FormController::new(sample_form())
        .expect("sample form is valid")
        .with_retry_policy(RetryPolicy::new(3, 10))
}

pub fn fill_personal(form: &mut FormController) {
    form.change("name", "Kamal Perera").unwrap();
    form.change("email", "kamal@example.com").unwrap();
    form.change("age", "40").unwrap();
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    rasterize_png(
        &SignatureOptions {
            canvas_width: 16,
            canvas_height: 8,
            ..SignatureOptions::default()
        },
        &[],
    )
    .expect("encode png")
}
