//! Signature capture: freehand drawing and uploaded images.
//!
//! Both capture modes keep their data until the field is cleared, so a user
//! can flip between the draw pad and the upload area without losing work.
//! Which of the two is submitted follows the most recent capture.

pub mod export;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::files::FileRecord;
use crate::form::definition::SignatureOptions;

pub use export::{rasterize_png, verify_image, ImageCheck};

/// RGBA colour used for strokes and canvas backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            "blue" => return Ok(Color::rgb(0, 0, 255)),
            "red" => return Ok(Color::rgb(255, 0, 0)),
            _ => {}
        }
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("unsupported colour `{trimmed}`"))?;
        let channel = |index: usize| {
            hex.get(index..index + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex colour `{trimmed}`"))
        };
        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => Err(format!("invalid hex colour `{trimmed}`")),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One straight line of a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// Which input area is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMode {
    #[default]
    Draw,
    Upload,
}

/// What will be submitted for the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureSource {
    #[default]
    None,
    Drawn,
    Uploaded,
}

/// A verified uploaded signature image.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub record: FileRecord,
    pub bytes: Vec<u8>,
    pub format: &'static str,
}

/// Change to report to the form after a capture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureChange {
    /// The field now has a drawn signature.
    Drawn,
    /// The field fell back to its uploaded image.
    Uploaded,
    /// Nothing is captured any more.
    Cleared,
}

/// Capture state for one signature field.
#[derive(Debug, Clone)]
pub struct SignatureCapture {
    options: SignatureOptions,
    mode: SignatureMode,
    source: SignatureSource,
    segments: Vec<Segment>,
    last: Point,
    drawing: bool,
    uploaded: Option<UploadedImage>,
    status: Option<String>,
}

impl SignatureCapture {
    pub fn new(options: SignatureOptions) -> Self {
        Self {
            options,
            mode: SignatureMode::Draw,
            source: SignatureSource::None,
            segments: Vec::new(),
            last: Point::default(),
            drawing: false,
            uploaded: None,
            status: None,
        }
    }

    pub fn options(&self) -> &SignatureOptions {
        &self.options
    }

    pub fn mode(&self) -> SignatureMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SignatureMode) {
        self.mode = mode;
    }

    pub fn source(&self) -> SignatureSource {
        self.source
    }

    pub fn has_signature(&self) -> bool {
        self.source != SignatureSource::None
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    /// Latest human-readable status for the renderer.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    fn clamp(&self, x: f32, y: f32) -> Point {
        Point::new(
            x.clamp(0.0, self.options.canvas_width as f32),
            y.clamp(0.0, self.options.canvas_height as f32),
        )
    }

    pub fn drag_start(&mut self, x: f32, y: f32) {
        self.last = self.clamp(x, y);
        self.drawing = true;
    }

    /// Appends a segment from the last pen position. Returns a change when
    /// this segment is what turned the field into a drawn signature.
    pub fn drag_update(&mut self, x: f32, y: f32) -> Option<CaptureChange> {
        if !self.drawing {
            return None;
        }
        let next = self.clamp(x, y);
        self.segments.push(Segment {
            from: self.last,
            to: next,
        });
        self.last = next;

        if self.source != SignatureSource::Drawn {
            self.source = SignatureSource::Drawn;
            self.set_status("Signature drawn");
            Some(CaptureChange::Drawn)
        } else {
            None
        }
    }

    /// Ends the gesture. Returns whether a gesture was in progress.
    pub fn drag_end(&mut self) -> bool {
        std::mem::replace(&mut self.drawing, false)
    }

    /// Removes the most recent segment while in draw mode.
    pub fn undo(&mut self) -> Option<CaptureChange> {
        if self.mode != SignatureMode::Draw || self.segments.pop().is_none() {
            return None;
        }
        self.set_status("Last stroke undone");
        if !self.segments.is_empty() || self.source != SignatureSource::Drawn {
            return None;
        }
        if self.uploaded.is_some() {
            self.source = SignatureSource::Uploaded;
            Some(CaptureChange::Uploaded)
        } else {
            self.source = SignatureSource::None;
            Some(CaptureChange::Cleared)
        }
    }

    pub(crate) fn accept_upload(&mut self, image: UploadedImage) {
        self.set_status(format!(
            "{} ({}KB) uploaded",
            image.record.name,
            image.record.size / 1024
        ));
        self.uploaded = Some(image);
        self.source = SignatureSource::Uploaded;
    }

    /// Discards strokes and any uploaded image. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.drawing = false;
        self.uploaded = None;
        self.source = SignatureSource::None;
        self.set_status("Signature cleared");
    }

    /// Image bytes for submission: a PNG of the strokes when drawn, the
    /// stored bytes when uploaded, and empty when nothing was captured.
    pub fn export(&self) -> crate::FormResult<Vec<u8>> {
        match self.source {
            SignatureSource::Drawn => rasterize_png(&self.options, &self.segments),
            SignatureSource::Uploaded => Ok(self
                .uploaded
                .as_ref()
                .map(|image| image.bytes.clone())
                .unwrap_or_default()),
            SignatureSource::None => Ok(Vec::new()),
        }
    }

    /// Format label of what [`export`](Self::export) returns.
    pub fn export_format(&self) -> &'static str {
        match (&self.source, &self.uploaded) {
            (SignatureSource::Uploaded, Some(image)) => image.format,
            _ => "PNG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> SignatureCapture {
        SignatureCapture::new(SignatureOptions::default())
    }

    #[test]
    fn first_segment_marks_signature_drawn() {
        let mut pad = capture();
        pad.drag_start(10.0, 10.0);
        assert_eq!(pad.drag_update(20.0, 15.0), Some(CaptureChange::Drawn));
        assert_eq!(pad.drag_update(30.0, 20.0), None);
        assert!(pad.drag_end());
        assert_eq!(pad.segments().len(), 2);
        assert_eq!(pad.source(), SignatureSource::Drawn);
    }

    #[test]
    fn updates_without_start_are_ignored() {
        let mut pad = capture();
        assert_eq!(pad.drag_update(5.0, 5.0), None);
        assert!(pad.segments().is_empty());
        assert!(!pad.drag_end());
    }

    #[test]
    fn points_are_clamped_to_canvas() {
        let mut pad = capture();
        pad.drag_start(-40.0, 500.0);
        pad.drag_update(1000.0, -3.0);
        let segment = pad.segments()[0];
        assert_eq!(segment.from, Point::new(0.0, 120.0));
        assert_eq!(segment.to, Point::new(300.0, 0.0));
    }

    #[test]
    fn undo_to_empty_clears_signature() {
        let mut pad = capture();
        pad.drag_start(1.0, 1.0);
        pad.drag_update(2.0, 2.0);
        pad.drag_update(3.0, 3.0);
        assert_eq!(pad.undo(), None);
        assert_eq!(pad.undo(), Some(CaptureChange::Cleared));
        assert!(!pad.has_signature());
        assert_eq!(pad.undo(), None);
    }

    #[test]
    fn undo_is_ignored_in_upload_mode() {
        let mut pad = capture();
        pad.drag_start(1.0, 1.0);
        pad.drag_update(2.0, 2.0);
        pad.set_mode(SignatureMode::Upload);
        assert_eq!(pad.undo(), None);
        assert_eq!(pad.segments().len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut pad = capture();
        pad.clear();
        pad.clear();
        assert!(!pad.has_signature());
        assert!(pad.export().unwrap().is_empty());
        assert_eq!(pad.status(), Some("Signature cleared"));
    }

    #[test]
    fn colours_parse_from_names_and_hex() {
        assert_eq!("black".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#1a2b3c".parse::<Color>().unwrap(), Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!("#00000080".parse::<Color>().unwrap().a, 0x80);
        assert!("#12".parse::<Color>().is_err());
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "#ff0000");
    }
}
