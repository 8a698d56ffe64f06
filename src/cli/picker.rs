//! File picker backed by paths typed at the shell.

use std::io;
use std::path::PathBuf;

use crate::files::{FilePicker, PickRequest, PickedFile};

/// Returns the configured paths as picked files. Paths that do not exist
/// yet are still returned with size 0; their content is read lazily.
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    paths: Vec<PathBuf>,
}

impl PathPicker {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl FilePicker for PathPicker {
    async fn pick(&self, request: &PickRequest) -> io::Result<Vec<PickedFile>> {
        let limit = if request.allow_multiple {
            self.paths.len()
        } else {
            1
        };
        let mut picked = Vec::new();
        for path in self.paths.iter().take(limit) {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let size = match smol::fs::metadata(path).await {
                Ok(meta) => meta.len(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
                Err(err) => return Err(err),
            };
            picked.push(PickedFile::new(name, size).with_path(path.clone()));
        }
        Ok(picked)
    }
}
