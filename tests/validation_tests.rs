mod common;

use std::collections::BTreeMap;

use insta::assert_snapshot;
use slnic_bridge::files::{FileRecord, PickedFile};
use slnic_bridge::form::{
    FieldDefinition, FieldType, FieldValue, FileOptions, Pattern, SignatureOptions,
    ValidationRules,
};
use slnic_bridge::validation::{validate_field, validate_form};

fn check(field: &FieldDefinition, value: impl Into<FieldValue>) -> Option<String> {
    validate_field(field, Some(&value.into()), &[])
}

fn file(name: &str, size: u64) -> FileRecord {
    FileRecord::from_picked(PickedFile::new(name, size))
}

#[test]
fn email_requires_a_dotted_domain() {
    let field = FieldDefinition::new("email", "Email", FieldType::Email);
    assert_snapshot!(check(&field, "bob@example").unwrap(), @"Please enter a valid email address");
    assert_eq!(check(&field, "bob@example.com"), None);
}

#[test]
fn number_bounds_are_inclusive() {
    let field = FieldDefinition::new("age", "Age", FieldType::Number).with_validation(
        ValidationRules {
            min: Some(18.0),
            max: Some(65.0),
            ..ValidationRules::default()
        },
    );
    assert_snapshot!(check(&field, "17").unwrap(), @"Value must be at least 18");
    assert_eq!(check(&field, "40"), None);
    assert_eq!(check(&field, "18"), None);
    assert_eq!(check(&field, "65"), None);
    assert_snapshot!(check(&field, "66").unwrap(), @"Value must be at most 65");
    assert_snapshot!(check(&field, "forty").unwrap(), @"Please enter a valid number");
}

#[test]
fn required_fields_report_their_label() {
    let field = FieldDefinition::new("name", "Full Name", FieldType::Text).required();
    assert_snapshot!(check(&field, "   ").unwrap(), @"Full Name is required");
    assert_eq!(
        validate_field(&field, None, &[]).as_deref(),
        Some("Full Name is required")
    );
}

#[test]
fn blank_optional_text_skips_every_other_rule() {
    let field = FieldDefinition::new("code", "Code", FieldType::Text).with_validation(
        ValidationRules {
            min_length: Some(5),
            pattern: Some(Pattern::new("[A-Z]+").unwrap()),
            ..ValidationRules::default()
        },
    );
    assert_eq!(check(&field, ""), None);
}

#[test]
fn pattern_must_match_the_whole_value() {
    let field = FieldDefinition::new("nic", "NIC", FieldType::Text).with_validation(
        ValidationRules {
            pattern: Some(Pattern::new("[0-9]{9}[vVxX]").unwrap()),
            ..ValidationRules::default()
        },
    );
    assert_eq!(check(&field, "123456789V"), None);
    assert_eq!(check(&field, "123456789V-extra").as_deref(), Some("Invalid format"));

    let custom = FieldDefinition::new("nic", "NIC", FieldType::Text).with_validation(
        ValidationRules {
            pattern: Some(Pattern::new("[0-9]{12}").unwrap()),
            message: Some("Use the 12-digit format".into()),
            ..ValidationRules::default()
        },
    );
    assert_eq!(check(&custom, "12345").as_deref(), Some("Use the 12-digit format"));
}

#[test]
fn length_rules_count_trimmed_characters() {
    let field = FieldDefinition::new("name", "Name", FieldType::Text).with_validation(
        ValidationRules {
            min_length: Some(3),
            max_length: Some(5),
            ..ValidationRules::default()
        },
    );
    assert_snapshot!(check(&field, "  ab  ").unwrap(), @"Must be at least 3 characters");
    assert_snapshot!(check(&field, "abcdef").unwrap(), @"Must be at most 5 characters");
    assert_eq!(check(&field, " abcd "), None);
}

#[test]
fn checkbox_required_means_checked() {
    let field = FieldDefinition::new("agree", "Agreement", FieldType::Checkbox).required();
    assert_eq!(check(&field, false).as_deref(), Some("Agreement is required"));
    assert_eq!(check(&field, true), None);
}

#[test]
fn file_rules_check_each_attachment() {
    let field = FieldDefinition::new(
        "doc",
        "Document",
        FieldType::File(FileOptions {
            allowed_extensions: Some(common::extensions(&["pdf", ".JPG"])),
            max_file_size: Some(1024 * 1024),
            multiple: true,
        }),
    )
    .required();

    assert_eq!(
        validate_field(&field, None, &[]).as_deref(),
        Some("Document is required")
    );
    assert_eq!(validate_field(&field, None, &[file("scan.jpg", 10)]), None);
    assert_eq!(
        validate_field(&field, None, &[file("a.pdf", 1), file("notes.txt", 1)]).as_deref(),
        Some("File type not allowed. Allowed types: .JPG, pdf")
    );
}

#[test]
fn oversized_files_report_size_and_limit() {
    let field = FieldDefinition::new(
        "doc",
        "Document",
        FieldType::File(FileOptions {
            allowed_extensions: None,
            max_file_size: Some(1024 * 1024),
            multiple: false,
        }),
    );
    let error = validate_field(&field, None, &[file("big.pdf", 3 * 1024 * 1024 / 2)]).unwrap();
    assert_snapshot!(error, @"File too large: big.pdf is 1.5MB (max: 1.0MB)");
}

#[test]
fn signatures_accept_drawn_marker_or_upload() {
    let field = FieldDefinition::new(
        "sig",
        "Signature",
        FieldType::Signature(SignatureOptions::default()),
    )
    .required();
    assert_eq!(
        validate_field(&field, Some(&FieldValue::empty()), &[]).as_deref(),
        Some("Signature is required")
    );
    assert_eq!(check(&field, "signature_drawn"), None);
    assert_eq!(
        validate_field(&field, Some(&FieldValue::empty()), &[file("sig.png", 10)]),
        None
    );
    assert!(validate_field(&field, Some(&FieldValue::empty()), &[file("sig.tiff", 10)])
        .unwrap()
        .starts_with("Image type not allowed"));
}

#[test]
fn custom_validator_runs_last_and_ignores_empty_messages() {
    let field = FieldDefinition::new("name", "Name", FieldType::Text)
        .with_validation(ValidationRules {
            min_length: Some(2),
            ..ValidationRules::default()
        })
        .with_custom_validator(|value| match value.as_text() {
            Some("admin") => Some("Name is reserved".into()),
            Some("blank") => Some(String::new()),
            _ => None,
        });
    assert_eq!(check(&field, "a").as_deref(), Some("Must be at least 2 characters"));
    assert_eq!(check(&field, "admin").as_deref(), Some("Name is reserved"));
    assert_eq!(check(&field, "blank"), None);
    assert_eq!(check(&field, "Kamal"), None);
}

#[test]
fn password_rules_check_character_classes() {
    let field = FieldDefinition::new("pw", "Password", FieldType::Password).with_validation(
        ValidationRules {
            require_uppercase: true,
            require_digit: true,
            require_special: true,
            ..ValidationRules::default()
        },
    );
    assert_eq!(
        check(&field, "secret1!").as_deref(),
        Some("Must contain an uppercase letter")
    );
    assert_eq!(check(&field, "Secret!").as_deref(), Some("Must contain a digit"));
    assert_eq!(
        check(&field, "Secret1").as_deref(),
        Some("Must contain a special character")
    );
    assert_eq!(check(&field, "Secret1!"), None);
}

#[test]
fn form_validation_collects_failures_by_key() {
    let config = common::sample_form();
    let mut values = BTreeMap::new();
    values.insert("name".to_string(), FieldValue::from("Kamal"));
    values.insert("email".to_string(), FieldValue::from("kamal@"));
    values.insert("age".to_string(), FieldValue::from("30"));
    let errors = validate_form(config.fields(), &values, &BTreeMap::new());

    let keys: Vec<_> = errors.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["agree", "certificate", "email", "signature"]);
    assert_eq!(errors["email"], "Please enter a valid email address");
}
