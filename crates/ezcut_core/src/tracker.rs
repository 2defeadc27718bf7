use std::path::{Path, PathBuf};

use url::Url;

pub type FileId = u64;

/// Media types accepted for upload, keyed by lowercase extension.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("ts", "video/mp2t"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
];

/// Media type for an accepted video file, `None` for anything else.
pub fn media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?;
    MEDIA_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name, size }
    }

    pub fn media_type(&self) -> Option<&'static str> {
        media_type(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileStatus {
    #[default]
    Uploaded,
    Processing,
    Processed,
    Error,
}

/// Displayable local reference to a selected file.
///
/// Not `Clone`: the tracker holds the only copy and hands it back to the
/// provider exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    url: Url,
}

impl PreviewHandle {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub trait PreviewProvider {
    /// Creates a handle for `file`, or `None` when it cannot be previewed.
    fn open(&mut self, file: &MediaFile) -> Option<PreviewHandle>;
    fn release(&mut self, handle: PreviewHandle);
}

#[derive(Debug)]
pub struct TrackedFile {
    pub id: FileId,
    pub file: MediaFile,
    pub status: FileStatus,
    preview: PreviewHandle,
}

impl TrackedFile {
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// Owns the selected files and their preview handles.
///
/// Every tracked file holds exactly one live handle; handles go back to the
/// provider on removal, on clear, and when the tracker is dropped.
pub struct ResourceTracker<P: PreviewProvider> {
    provider: P,
    files: Vec<TrackedFile>,
    active: Option<FileId>,
    next_id: FileId,
}

impl<P: PreviewProvider> ResourceTracker<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            files: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Tracks every accepted media file and returns the new ids.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = MediaFile>) -> Vec<FileId> {
        let mut added = Vec::new();
        for file in files {
            if file.media_type().is_none() {
                continue;
            }
            let Some(preview) = self.provider.open(&file) else {
                continue;
            };
            let id = self.next_id;
            self.next_id += 1;
            self.files.push(TrackedFile {
                id,
                file,
                status: FileStatus::Uploaded,
                preview,
            });
            added.push(id);
        }
        if self.active.is_none() {
            self.active = added.first().copied();
        }
        added
    }

    pub fn remove_file(&mut self, id: FileId) -> bool {
        let Some(index) = self.files.iter().position(|tracked| tracked.id == id) else {
            return false;
        };
        let removed = self.files.remove(index);
        if self.active == Some(id) {
            self.active = self.files.first().map(|tracked| tracked.id);
        }
        self.provider.release(removed.preview);
        true
    }

    pub fn clear_all(&mut self) {
        self.active = None;
        for tracked in std::mem::take(&mut self.files) {
            self.provider.release(tracked.preview);
        }
    }

    pub fn select(&mut self, id: FileId) -> bool {
        if self.files.iter().any(|tracked| tracked.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn mark_all(&mut self, status: FileStatus) {
        for tracked in &mut self.files {
            tracked.status = status;
        }
    }

    pub fn active(&self) -> Option<&TrackedFile> {
        let id = self.active?;
        self.files.iter().find(|tracked| tracked.id == id)
    }

    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.files.iter().map(|tracked| tracked.id).collect()
    }

    /// Media files for the given ids, in tracking order.
    pub fn media_for(&self, ids: &[FileId]) -> Vec<MediaFile> {
        self.files
            .iter()
            .filter(|tracked| ids.contains(&tracked.id))
            .map(|tracked| tracked.file.clone())
            .collect()
    }

    /// Handles opened and not yet released; always equal to `len()`.
    pub fn live_handles(&self) -> usize {
        self.files.len()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: PreviewProvider> Drop for ResourceTracker<P> {
    fn drop(&mut self) {
        self.clear_all();
    }
}
