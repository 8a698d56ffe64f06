mod common;

use std::thread;
use std::time::Duration;

use assert_fs::prelude::*;
use slnic_bridge::cli::PathPicker;
use slnic_bridge::files::{PickedFile, RetryPolicy};
use slnic_bridge::form::FieldValue;
use slnic_bridge::FormError;

use common::sample_controller;

#[test]
fn single_file_fields_replace_the_previous_pick() {
    let mut form = sample_controller();
    form.apply_pick("certificate", vec![PickedFile::new("old.pdf", 10)])
        .unwrap();
    form.apply_pick("certificate", vec![PickedFile::new("new.pdf", 20)])
        .unwrap();

    let files = form.state().files("certificate");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "new.pdf");
    assert_eq!(form.field_value("certificate"), Some(&FieldValue::from("new.pdf")));
    assert_eq!(form.state().error("certificate"), None);
}

#[test]
fn multi_file_fields_append_with_unique_ids() {
    let mut form = sample_controller();
    form.apply_pick(
        "extras",
        vec![PickedFile::new("scan.jpg", 1), PickedFile::new("scan.jpg", 1)],
    )
    .unwrap();
    form.apply_pick("extras", vec![PickedFile::new("letter.pdf", 2)])
        .unwrap();

    let files = form.state().files("extras");
    assert_eq!(files.len(), 3);
    assert_ne!(files[0].id, files[1].id);
    assert_eq!(files[0].name, files[1].name);
}

#[test]
fn removal_is_by_id_and_updates_the_field_value() {
    let mut form = sample_controller();
    form.apply_pick(
        "extras",
        vec![PickedFile::new("a.jpg", 1), PickedFile::new("b.jpg", 1)],
    )
    .unwrap();
    let first = form.state().files("extras")[0].id;
    let second = form.state().files("extras")[1].id;

    assert!(form.remove_file("extras", first).unwrap());
    assert!(!form.remove_file("extras", first).unwrap());
    assert_eq!(form.state().files("extras")[0].id, second);
    assert_eq!(form.field_value("extras"), Some(&FieldValue::from("b.jpg")));

    assert!(form.remove_file("extras", second).unwrap());
    assert!(form.state().files("extras").is_empty());
    assert_eq!(form.field_value("extras"), Some(&FieldValue::empty()));
}

#[test]
fn removing_a_required_file_shows_the_required_error() {
    let mut form = sample_controller();
    form.apply_pick("certificate", vec![PickedFile::new("c.pdf", 1)])
        .unwrap();
    let id = form.state().files("certificate")[0].id;
    form.remove_file("certificate", id).unwrap();
    assert_eq!(
        form.state().visible_error("certificate"),
        Some("Certificate is required")
    );
}

#[test]
fn disallowed_types_are_reported_after_picking() {
    let mut form = sample_controller();
    form.apply_pick("certificate", vec![PickedFile::new("notes.TXT", 1)])
        .unwrap();
    assert_eq!(
        form.state().visible_error("certificate"),
        Some("File type not allowed. Allowed types: jpg, pdf")
    );
    form.apply_pick("certificate", vec![PickedFile::new("SCAN.JPG", 1)])
        .unwrap();
    assert_eq!(form.state().error("certificate"), None);
}

#[test]
fn dismissed_picker_changes_nothing() {
    let mut form = sample_controller();
    assert_eq!(form.apply_pick("extras", Vec::new()).unwrap(), 0);
    assert!(form.state().files("extras").is_empty());
    assert!(!form.state().is_touched("extras"));
}

#[test]
fn picking_into_a_text_field_is_rejected() {
    let mut form = sample_controller();
    let err = form
        .apply_pick("name", vec![PickedFile::new("a.pdf", 1)])
        .unwrap_err();
    assert!(matches!(err, FormError::WrongFieldType { .. }));
}

#[test]
fn path_picker_records_paths_and_sizes() {
    let temp = assert_fs::TempDir::new().unwrap();
    let doc = temp.child("birth.pdf");
    doc.write_binary(&[0u8; 64]).unwrap();

    let mut form = sample_controller();
    let picker = PathPicker::new([doc.path()]);
    let added = smol::block_on(form.pick_files("certificate", &picker)).unwrap();
    assert_eq!(added, 1);

    let record = &form.state().files("certificate")[0];
    assert_eq!(record.size, 64);
    assert_eq!(record.mime_type, "application/pdf");
    assert_eq!(
        form.field_value("certificate"),
        Some(&FieldValue::from(doc.path().display().to_string()))
    );
}

#[test]
fn content_written_late_is_picked_up_by_retries() {
    let temp = assert_fs::TempDir::new().unwrap();
    let late = temp.child("late.pdf");
    let path = late.path().to_path_buf();

    let mut form = sample_controller().with_retry_policy(RetryPolicy::new(50, 10));
    form.apply_pick(
        "certificate",
        vec![PickedFile::new("late.pdf", 0).with_path(&path)],
    )
    .unwrap();
    let id = form.state().files("certificate")[0].id;

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        let staged = path.with_extension("part");
        std::fs::write(&staged, b"%PDF-1.4").unwrap();
        std::fs::rename(staged, &path).unwrap();
    });
    let resolved = smol::block_on(form.resolve_file_content("certificate", id)).unwrap();
    writer.join().unwrap();

    assert!(resolved);
    let record = &form.state().files("certificate")[0];
    assert_eq!(record.content.as_deref(), Some(&b"%PDF-1.4"[..]));
    assert_eq!(record.size, 8);
}

#[test]
fn unreadable_content_keeps_the_metadata() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.child("never.pdf");

    let mut form = sample_controller();
    form.apply_pick(
        "certificate",
        vec![PickedFile::new("never.pdf", 12).with_path(missing.path())],
    )
    .unwrap();
    let id = form.state().files("certificate")[0].id;

    let resolved = smol::block_on(form.resolve_file_content("certificate", id)).unwrap();
    assert!(!resolved);
    let record = &form.state().files("certificate")[0];
    assert_eq!(record.content, None);
    assert_eq!(record.size, 12);
}

#[test]
fn file_uri_paths_are_read_from_disk() {
    let temp = assert_fs::TempDir::new().unwrap();
    let doc = temp.child("uri.pdf");
    doc.write_binary(b"data").unwrap();
    let uri = format!("file://{}", doc.path().display());

    let mut form = sample_controller();
    form.apply_pick(
        "certificate",
        vec![PickedFile::new("uri.pdf", 4).with_path(uri)],
    )
    .unwrap();
    let id = form.state().files("certificate")[0].id;
    assert!(smol::block_on(form.resolve_file_content("certificate", id)).unwrap());
}
