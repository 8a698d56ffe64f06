//! File attachment records and the picker protocol.
//!
//! A pick happens in two phases: the picker reports metadata (and sometimes
//! inline bytes) first, and only later is the file guaranteed to be readable
//! from disk. Records are therefore built from whatever metadata arrived, and
//! content is resolved separately through [`reader::ContentReader`].

pub mod reader;

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use reader::{ContentReader, RetryPolicy};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One file as reported by the platform picker. Any of `path` and `bytes`
/// may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickedFile {
    pub name: String,
    pub path: Option<PathBuf>,
    pub bytes: Option<Vec<u8>>,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.size = bytes.len() as u64;
        self.bytes = Some(bytes);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Parameters handed to the picker for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub field_key: String,
    pub allow_multiple: bool,
    pub allowed_extensions: Option<BTreeSet<String>>,
}

/// Platform file picker. Resolves to zero or more picked files; an empty
/// result means the user dismissed the dialog.
#[allow(async_fn_in_trait)]
pub trait FilePicker {
    async fn pick(&self, request: &PickRequest) -> std::io::Result<Vec<PickedFile>>;
}

/// Metadata for one attached file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub path: Option<PathBuf>,
    pub size: u64,
    pub mime_type: String,
    pub picked_at: DateTime<Utc>,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

impl FileRecord {
    /// Builds a record from picker metadata with a fresh random id.
    pub fn from_picked(file: PickedFile) -> Self {
        let mime_type = file
            .mime_type
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or_else(|| guess_mime_type(&file.name).to_string());
        Self {
            id: Uuid::new_v4(),
            name: file.name,
            path: file.path,
            size: file.size,
            mime_type,
            picked_at: Utc::now(),
            content: file.bytes,
        }
    }

    /// Lowercased substring after the last `.`, or the whole name when there
    /// is no dot.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    /// String used as the owning field's value: the path when known,
    /// otherwise the file name.
    pub fn display_value(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.name.clone(),
        }
    }
}

pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// Strips a `file://` scheme from picker-reported paths.
pub fn local_path(path: &Path) -> PathBuf {
    match path.to_str().and_then(|raw| raw.strip_prefix("file://")) {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

fn guess_mime_type(name: &str) -> &'static str {
    match extension_of(name).as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => DEFAULT_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_picked_in_the_same_instant_get_distinct_ids() {
        let picked = PickedFile::new("scan.pdf", 10);
        let ids: BTreeSet<Uuid> = (0..64)
            .map(|_| FileRecord::from_picked(picked.clone()).id)
            .collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn extension_is_lowercased_after_last_dot() {
        assert_eq!(extension_of("Photo.Final.JPG"), "jpg");
        assert_eq!(extension_of("README"), "readme");
    }

    #[test]
    fn display_value_prefers_path() {
        let record = FileRecord::from_picked(PickedFile::new("a.png", 1).with_path("/tmp/a.png"));
        assert_eq!(record.display_value(), "/tmp/a.png");
        assert_eq!(record.mime_type, "image/png");
        let record = FileRecord::from_picked(PickedFile::new("a.bin", 1));
        assert_eq!(record.display_value(), "a.bin");
        assert_eq!(record.mime_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn file_scheme_is_stripped() {
        assert_eq!(
            local_path(Path::new("file:///data/user/sig.png")),
            PathBuf::from("/data/user/sig.png")
        );
        assert_eq!(local_path(Path::new("/plain")), PathBuf::from("/plain"));
    }
}
