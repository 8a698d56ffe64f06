use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use slnic_bridge::files::{FileRecord, PickedFile};
use slnic_bridge::form::{FieldValue, FormConfig, FormController};
use slnic_bridge::validation::validate_form;

fn filled_values() -> BTreeMap<String, FieldValue> {
    [
        ("full_name", FieldValue::from("Kamal Perera")),
        ("nic_number", FieldValue::from("199012345678")),
        ("email", FieldValue::from("kamal@example.lk")),
        ("age", FieldValue::from("34")),
        ("address", FieldValue::from("12 Galle Road, Colombo 03")),
        ("agree", FieldValue::Bool(true)),
        ("signature", FieldValue::from("signature_drawn")),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn attachments() -> BTreeMap<String, Vec<FileRecord>> {
    let mut files = BTreeMap::new();
    files.insert(
        "birth_certificate".to_string(),
        vec![FileRecord::from_picked(PickedFile::new("birth.pdf", 200_000))],
    );
    files.insert(
        "photos".to_string(),
        (0..8)
            .map(|idx| FileRecord::from_picked(PickedFile::new(format!("photo_{idx}.jpg"), 90_000)))
            .collect(),
    );
    files
}

fn bench_validation(c: &mut Criterion) {
    let config = FormConfig::nic_application().expect("built-in form");
    let values = filled_values();
    let files = attachments();

    c.bench_function("validate_nic_form", |b| {
        b.iter(|| {
            let errors = validate_form(black_box(config.fields()), &values, &files);
            black_box(errors)
        })
    });

    c.bench_function("submit_drawn_signature", |b| {
        b.iter_batched(
            || {
                let mut form = FormController::new(config.clone()).expect("controller");
                form.signature_drag_start("signature", 10.0, 60.0).expect("drag");
                for step in 1..40 {
                    let x = 10.0 + step as f32 * 7.0;
                    let y = 60.0 + (step as f32 * 0.7).sin() * 30.0;
                    form.signature_drag_update("signature", x, y).expect("drag");
                }
                form
            },
            |form| black_box(form.assemble_payload()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_validation);
criterion_main!(benches);
