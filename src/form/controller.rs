//! Form session owner: field events, step navigation, attachments,
//! signatures and submission.
//!
//! Every handler runs to completion before the next event is processed, so
//! the controller needs no locking. Each mutating call raises the redraw flag
//! returned by [`FormController::take_redraw`].

use std::fmt;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{FormError, FormResult};
use crate::files::{
    extension_of, ContentReader, FilePicker, FileRecord, PickRequest, PickedFile, RetryPolicy,
};
use crate::form::definition::{FieldDefinition, FieldType, FormConfig, SectionDefinition};
use crate::form::state::FormState;
use crate::form::submission::{self, CallbackError, SubmissionPayload, SubmitCallback};
use crate::form::value::{FieldValue, SIGNATURE_DRAWN};
use crate::signature::{
    verify_image, CaptureChange, ImageCheck, SignatureCapture, SignatureMode, UploadedImage,
};
use crate::validation::{self, extension_allowed, join_extensions};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Result of a step transition request.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Moved { from: usize, to: usize },
    /// Valid request with nowhere to go (first or last step).
    Unchanged,
    /// The step being left has errors; they are now visible.
    Blocked { step: usize },
}

impl NavigationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, NavigationOutcome::Blocked { .. })
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Validation failed; the form moved to the first step with an error.
    Invalid { step: usize, errors: usize },
    /// A submission is already running.
    Busy,
    /// The host callback failed; the form stays interactive.
    CallbackFailed(String),
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

/// Step indicator entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub index: usize,
    pub title: String,
    pub status: StepStatus,
}

fn lookup<'a>(config: &'a FormConfig, key: &str) -> FormResult<&'a FieldDefinition> {
    config
        .field(key)
        .ok_or_else(|| FormError::UnknownField(key.to_string()))
}

pub struct FormController {
    config: FormConfig,
    state: FormState,
    on_submit: Option<SubmitCallback>,
    on_cancel: Option<submission::CancelCallback>,
    auto_validate: bool,
    include_files: bool,
    reader: ContentReader,
    needs_redraw: bool,
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("form", &self.config.id)
            .field("state", &self.state)
            .field("auto_validate", &self.auto_validate)
            .finish_non_exhaustive()
    }
}

impl FormController {
    pub fn new(config: FormConfig) -> FormResult<Self> {
        config.verify()?;
        let state = FormState::initial(&config);
        info!(form = %config.id, steps = config.step_count(), "form session started");
        Ok(Self {
            config,
            state,
            on_submit: None,
            on_cancel: None,
            auto_validate: true,
            include_files: false,
            reader: ContentReader::default(),
            needs_redraw: true,
        })
    }

    pub fn with_submit_handler(
        mut self,
        handler: impl FnMut(&SubmissionPayload) -> Result<(), CallbackError> + 'static,
    ) -> Self {
        self.on_submit = Some(Box::new(handler));
        self
    }

    pub fn with_cancel_handler(mut self, handler: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(handler));
        self
    }

    /// When disabled, change and blur events do not validate.
    pub fn with_auto_validate(mut self, enabled: bool) -> Self {
        self.auto_validate = enabled;
        self
    }

    /// Adds the `_files` listing to submission payloads.
    pub fn with_file_listing(mut self, enabled: bool) -> Self {
        self.include_files = enabled;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.reader = ContentReader::new(policy);
        self
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn field(&self, key: &str) -> FormResult<&FieldDefinition> {
        lookup(&self.config, key)
    }

    pub fn field_value(&self, key: &str) -> Option<&FieldValue> {
        self.state.value(key)
    }

    pub fn current_section(&self) -> &SectionDefinition {
        &self.config.sections[self.state.current_step]
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step + 1 == self.config.step_count()
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Returns and clears the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.needs_redraw, false)
    }

    pub fn step_summaries(&self) -> Vec<StepSummary> {
        let current = self.state.current_step;
        self.config
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| StepSummary {
                index,
                title: section.title.clone(),
                status: match index.cmp(&current) {
                    std::cmp::Ordering::Less => StepStatus::Completed,
                    std::cmp::Ordering::Equal => StepStatus::Current,
                    std::cmp::Ordering::Greater => StepStatus::Pending,
                },
            })
            .collect()
    }

    // ----- field events -------------------------------------------------

    /// Records a new value. A field already in error is re-validated at once
    /// so the message clears as soon as the input is fixed.
    pub fn change(&mut self, key: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        lookup(&self.config, key)?;
        let value = value.into();
        debug!(field = key, %value, "field changed");
        self.state.values.insert(key.to_string(), value);
        self.state.touch(key);
        if self.auto_validate && self.state.errors.contains_key(key) {
            self.validate_single(key)?;
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Programmatic equivalent of a user edit.
    pub fn set_field_value(&mut self, key: &str, value: impl Into<FieldValue>) -> FormResult<()> {
        self.change(key, value)
    }

    pub fn blur(&mut self, key: &str) -> FormResult<()> {
        lookup(&self.config, key)?;
        debug!(field = key, "field blurred");
        self.state.touch(key);
        if self.auto_validate {
            self.validate_single(key)?;
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Validates one field now and records the result. Returns validity.
    pub fn validate_field(&mut self, key: &str) -> FormResult<bool> {
        let valid = self.validate_single(key)?;
        self.needs_redraw = true;
        Ok(valid)
    }

    fn validate_single(&mut self, key: &str) -> FormResult<bool> {
        let field = lookup(&self.config, key)?;
        let error = validation::validate_field(field, self.state.values.get(key), self.state.files(key));
        let valid = error.is_none();
        self.state.record_error(key, error);
        Ok(valid)
    }

    fn validate_step(&mut self, step: usize) -> bool {
        let keys: Vec<String> = self.config.sections[step]
            .fields
            .iter()
            .map(|field| field.key.clone())
            .collect();
        let mut valid = true;
        for key in keys {
            self.state.touch(&key);
            // Keys come from the config, so lookup cannot fail.
            if !self.validate_single(&key).unwrap_or(false) {
                valid = false;
            }
        }
        valid
    }

    /// Validates the whole form, marking every field touched.
    pub fn validate_all(&mut self) -> bool {
        let errors = validation::validate_form(
            self.config.fields(),
            &self.state.values,
            &self.state.files,
        );
        let keys: Vec<String> = self.config.fields().map(|field| field.key.clone()).collect();
        for key in keys {
            self.state.touch(&key);
        }
        self.state.errors = errors;
        self.needs_redraw = true;
        self.state.errors.is_empty()
    }

    fn first_invalid_step(&self) -> Option<usize> {
        self.config.sections.iter().position(|section| {
            section
                .fields
                .iter()
                .any(|field| self.state.errors.contains_key(&field.key))
        })
    }

    // ----- navigation ---------------------------------------------------

    pub fn advance(&mut self) -> NavigationOutcome {
        let step = self.state.current_step;
        self.needs_redraw = true;
        if !self.validate_step(step) {
            info!(step, "step has errors; staying");
            return NavigationOutcome::Blocked { step };
        }
        if step + 1 < self.config.step_count() {
            self.state.current_step = step + 1;
            info!(from = step, to = step + 1, "advanced step");
            NavigationOutcome::Moved {
                from: step,
                to: step + 1,
            }
        } else {
            NavigationOutcome::Unchanged
        }
    }

    /// Goes back one step without validating.
    pub fn retreat(&mut self) -> NavigationOutcome {
        let step = self.state.current_step;
        if step == 0 {
            return NavigationOutcome::Unchanged;
        }
        self.state.current_step = step - 1;
        self.needs_redraw = true;
        info!(from = step, to = step - 1, "went back a step");
        NavigationOutcome::Moved {
            from: step,
            to: step - 1,
        }
    }

    /// Moves straight to `target`. Going forward requires the current step to
    /// be valid; intermediate steps are not checked.
    pub fn jump_to_step(&mut self, target: usize) -> FormResult<NavigationOutcome> {
        let steps = self.config.step_count();
        if target >= steps {
            return Err(FormError::StepOutOfRange {
                step: target,
                steps,
            });
        }
        let step = self.state.current_step;
        if target == step {
            return Ok(NavigationOutcome::Unchanged);
        }
        self.needs_redraw = true;
        if target > step && !self.validate_step(step) {
            info!(step, target, "step has errors; jump refused");
            return Ok(NavigationOutcome::Blocked { step });
        }
        self.state.current_step = target;
        info!(from = step, to = target, "jumped to step");
        Ok(NavigationOutcome::Moved {
            from: step,
            to: target,
        })
    }

    // ----- submission ---------------------------------------------------

    /// Payload the current state would submit, without submitting it.
    pub fn assemble_payload(&self) -> SubmissionPayload {
        submission::assemble(&self.config, &self.state, self.include_files)
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.state.is_submitting {
            debug!("submit ignored while a submission is running");
            return SubmitOutcome::Busy;
        }
        if !self.validate_all() {
            let errors = self.state.errors.len();
            let step = self
                .first_invalid_step()
                .unwrap_or(self.state.current_step);
            self.state.current_step = step;
            info!(step, errors, "submission blocked by validation errors");
            return SubmitOutcome::Invalid { step, errors };
        }

        self.state.is_submitting = true;
        let payload = self.assemble_payload();
        let result = match self.on_submit.as_mut() {
            Some(handler) => handler(&payload),
            None => Ok(()),
        };
        self.state.is_submitting = false;
        self.needs_redraw = true;

        match result {
            Ok(()) => {
                info!(form = %self.config.id, fields = payload.entries.len(), "form submitted");
                self.reset();
                SubmitOutcome::Submitted
            }
            Err(err) => {
                error!(form = %self.config.id, error = %err, "submission callback failed");
                SubmitOutcome::CallbackFailed(err.to_string())
            }
        }
    }

    /// Restores the initial state of the session.
    pub fn reset(&mut self) {
        self.state = FormState::initial(&self.config);
        self.needs_redraw = true;
        info!(form = %self.config.id, "form reset");
    }

    pub fn cancel(&mut self) {
        if let Some(handler) = self.on_cancel.as_mut() {
            handler();
        }
        self.reset();
    }

    // ----- files --------------------------------------------------------

    /// Picker parameters for a file or signature field.
    pub fn pick_request(&self, key: &str) -> FormResult<PickRequest> {
        let field = lookup(&self.config, key)?;
        match &field.field_type {
            FieldType::File(options) => Ok(PickRequest {
                field_key: key.to_string(),
                allow_multiple: options.multiple,
                allowed_extensions: options.allowed_extensions.clone(),
            }),
            FieldType::Signature(options) => Ok(PickRequest {
                field_key: key.to_string(),
                allow_multiple: false,
                allowed_extensions: Some(options.allowed_extensions.clone()),
            }),
            _ => Err(FormError::WrongFieldType {
                key: key.to_string(),
                expected: "file",
            }),
        }
    }

    /// Opens the picker for `key` and reconciles the result. Returns how many
    /// files were attached.
    pub async fn pick_files<P: FilePicker>(&mut self, key: &str, picker: &P) -> FormResult<usize> {
        let request = self.pick_request(key)?;
        let picked = picker.pick(&request).await?;
        if matches!(self.field(key)?.field_type, FieldType::Signature(_)) {
            let Some(file) = picked.into_iter().next() else {
                return Ok(0);
            };
            return match self.upload_signature(key, file).await? {
                UploadOutcome::Accepted => Ok(1),
                UploadOutcome::Rejected(_) => Ok(0),
            };
        }
        self.apply_pick(key, picked)
    }

    /// Records a picker result for a file field. Single-file fields keep only
    /// the newly picked file; multi-file fields append.
    pub fn apply_pick(&mut self, key: &str, picked: Vec<PickedFile>) -> FormResult<usize> {
        let field = lookup(&self.config, key)?;
        let multiple = field
            .file_options()
            .map(|options| options.multiple)
            .ok_or_else(|| FormError::WrongFieldType {
                key: key.to_string(),
                expected: "file",
            })?;
        if picked.is_empty() {
            debug!(field = key, "picker dismissed");
            return Ok(0);
        }

        let records: Vec<FileRecord> = picked.into_iter().map(FileRecord::from_picked).collect();
        let list = self.state.files.entry(key.to_string()).or_default();
        let added = if multiple {
            let added = records.len();
            list.extend(records);
            added
        } else {
            *list = records.into_iter().take(1).collect();
            1
        };
        let display = list.first().map(FileRecord::display_value);
        info!(field = key, added, total = list.len(), "files attached");

        if let Some(display) = display {
            self.change(key, display)?;
        }
        self.validate_single(key)?;
        self.needs_redraw = true;
        Ok(added)
    }

    /// Removes the file with `id`. Returns whether a record was removed.
    pub fn remove_file(&mut self, key: &str, id: Uuid) -> FormResult<bool> {
        let field = lookup(&self.config, key)?;
        if field.file_options().is_none() {
            return Err(FormError::WrongFieldType {
                key: key.to_string(),
                expected: "file",
            });
        }
        let Some(list) = self.state.files.get_mut(key) else {
            return Ok(false);
        };
        let Some(position) = list.iter().position(|record| record.id == id) else {
            return Ok(false);
        };
        let removed = list.remove(position);
        let replacement = list
            .first()
            .map(|record| FieldValue::from(record.display_value()))
            .unwrap_or_else(FieldValue::empty);
        info!(field = key, file = %removed.name, "file removed");

        let driving = self.state.value(key) == Some(&FieldValue::from(removed.display_value()));
        if driving {
            self.change(key, replacement)?;
        }
        self.validate_single(key)?;
        self.needs_redraw = true;
        Ok(true)
    }

    /// Loads the bytes of an attached file, retrying while the file is not
    /// yet on disk. Returns whether content is now available.
    pub async fn resolve_file_content(&mut self, key: &str, id: Uuid) -> FormResult<bool> {
        lookup(&self.config, key)?;
        let Some(record) = self
            .state
            .files(key)
            .iter()
            .find(|record| record.id == id)
            .cloned()
        else {
            return Ok(false);
        };
        if record.content.is_some() {
            return Ok(true);
        }
        let Some(path) = record.path else {
            warn!(field = key, file = %record.name, "no path to read content from");
            return Ok(false);
        };

        let reader = self.reader;
        let Some(bytes) = reader.read(&path).await else {
            return Ok(false);
        };
        if let Some(stored) = self
            .state
            .files
            .get_mut(key)
            .and_then(|list| list.iter_mut().find(|record| record.id == id))
        {
            stored.size = bytes.len() as u64;
            stored.content = Some(bytes);
        }
        self.validate_single(key)?;
        self.needs_redraw = true;
        Ok(true)
    }

    // ----- signatures ---------------------------------------------------

    fn capture_mut(&mut self, key: &str) -> FormResult<&mut SignatureCapture> {
        lookup(&self.config, key)?;
        self.state
            .signature_data
            .get_mut(key)
            .ok_or_else(|| FormError::WrongFieldType {
                key: key.to_string(),
                expected: "signature",
            })
    }

    fn report_capture(&mut self, key: &str, change: CaptureChange) -> FormResult<()> {
        match change {
            CaptureChange::Drawn => self.change(key, SIGNATURE_DRAWN),
            CaptureChange::Uploaded => {
                let name = self
                    .state
                    .signature(key)
                    .and_then(SignatureCapture::uploaded)
                    .map(|image| image.record.name.clone())
                    .unwrap_or_default();
                self.change(key, FieldValue::uploaded_signature(&name))?;
                self.validate_single(key).map(|_| ())
            }
            CaptureChange::Cleared => {
                self.change(key, FieldValue::empty())?;
                self.validate_single(key).map(|_| ())
            }
        }
    }

    pub fn signature_mode(&mut self, key: &str, mode: SignatureMode) -> FormResult<()> {
        self.capture_mut(key)?.set_mode(mode);
        self.needs_redraw = true;
        Ok(())
    }

    pub fn signature_drag_start(&mut self, key: &str, x: f32, y: f32) -> FormResult<()> {
        self.capture_mut(key)?.drag_start(x, y);
        Ok(())
    }

    pub fn signature_drag_update(&mut self, key: &str, x: f32, y: f32) -> FormResult<()> {
        if let Some(change) = self.capture_mut(key)?.drag_update(x, y) {
            self.report_capture(key, change)?;
        }
        self.needs_redraw = true;
        Ok(())
    }

    /// Ends a gesture and runs blur validation for the field.
    pub fn signature_drag_end(&mut self, key: &str) -> FormResult<()> {
        if self.capture_mut(key)?.drag_end() {
            self.blur(key)?;
        }
        Ok(())
    }

    /// Removes the last drawn segment. Returns whether the capture changed.
    pub fn signature_undo(&mut self, key: &str) -> FormResult<bool> {
        let capture = self.capture_mut(key)?;
        let before = capture.segments().len();
        let change = capture.undo();
        let changed = capture.segments().len() != before;
        if let Some(change) = change {
            self.report_capture(key, change)?;
        }
        if changed {
            self.needs_redraw = true;
        }
        Ok(changed)
    }

    /// Drops strokes and any uploaded image for the field.
    pub fn signature_clear(&mut self, key: &str) -> FormResult<()> {
        self.capture_mut(key)?.clear();
        self.state.files.remove(key);
        info!(field = key, "signature cleared");
        self.report_capture(key, CaptureChange::Cleared)?;
        self.needs_redraw = true;
        Ok(())
    }

    /// Accepts one picked image as the field's signature. Type, size and
    /// decodability are checked before anything is stored.
    pub async fn upload_signature(&mut self, key: &str, file: PickedFile) -> FormResult<UploadOutcome> {
        let field = lookup(&self.config, key)?;
        let options = field
            .signature_options()
            .cloned()
            .ok_or_else(|| FormError::WrongFieldType {
                key: key.to_string(),
                expected: "signature",
            })?;
        if !options.allow_image_upload {
            return Err(FormError::UploadNotAllowed(key.to_string()));
        }

        if !extension_allowed(&options.allowed_extensions, &extension_of(&file.name)) {
            let reason = format!(
                "Invalid file type. Allowed: {}",
                join_extensions(&options.allowed_extensions)
            );
            return self.reject_upload(key, reason);
        }
        if file.size > options.max_file_size {
            return self.reject_upload(key, oversize_message(file.size, options.max_file_size));
        }

        let mut record = FileRecord::from_picked(file);
        let bytes = match (record.content.take(), record.path.clone()) {
            (Some(bytes), _) => Some(bytes),
            (None, Some(path)) => {
                let reader = self.reader;
                reader.read(&path).await
            }
            (None, None) => None,
        };
        let Some(bytes) = bytes else {
            return self.reject_upload(key, "Could not read file data".to_string());
        };
        if bytes.len() as u64 > options.max_file_size {
            return self.reject_upload(key, oversize_message(bytes.len() as u64, options.max_file_size));
        }
        let format = match verify_image(&bytes) {
            ImageCheck::Valid { format, .. } => format,
            ImageCheck::Invalid(reason) => {
                return self.reject_upload(key, format!("Invalid image file: {reason}"));
            }
        };

        record.size = bytes.len() as u64;
        let name = record.name.clone();
        self.state.files.insert(key.to_string(), vec![record.clone()]);
        let capture = self.capture_mut(key)?;
        capture.set_mode(SignatureMode::Upload);
        capture.accept_upload(UploadedImage {
            record,
            bytes,
            format,
        });
        info!(field = key, file = %name, format, "signature image accepted");

        self.change(key, FieldValue::uploaded_signature(&name))?;
        self.validate_single(key)?;
        self.needs_redraw = true;
        Ok(UploadOutcome::Accepted)
    }

    fn reject_upload(&mut self, key: &str, reason: String) -> FormResult<UploadOutcome> {
        warn!(field = key, %reason, "signature upload rejected");
        self.capture_mut(key)?.set_status(reason.clone());
        self.needs_redraw = true;
        Ok(UploadOutcome::Rejected(reason))
    }
}

fn oversize_message(size: u64, max: u64) -> String {
    format!(
        "File too large: {:.1}MB (max: {:.1}MB)",
        size as f64 / BYTES_PER_MB,
        max as f64 / BYTES_PER_MB
    )
}
