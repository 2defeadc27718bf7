use ezcut_core::{MediaFile, PreviewHandle, PreviewProvider};
use ezcut_logging::{ezcut_debug, ezcut_warn};
use url::Url;

/// Previews local files through `file://` URLs.
#[derive(Debug, Default)]
pub struct FilePreviewProvider {
    live: usize,
}

impl FilePreviewProvider {
    pub fn live(&self) -> usize {
        self.live
    }
}

impl PreviewProvider for FilePreviewProvider {
    fn open(&mut self, file: &MediaFile) -> Option<PreviewHandle> {
        let absolute = match file.path.canonicalize() {
            Ok(path) => path,
            Err(err) => {
                ezcut_warn!("Cannot preview {:?}: {}", file.path, err);
                return None;
            }
        };
        let url = Url::from_file_path(&absolute).ok()?;
        self.live += 1;
        ezcut_debug!("Opened preview {} ({} live)", url, self.live);
        Some(PreviewHandle::new(url))
    }

    fn release(&mut self, handle: PreviewHandle) {
        self.live = self.live.saturating_sub(1);
        ezcut_debug!("Released preview {} ({} live)", handle.url(), self.live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ezcut_core::ResourceTracker;

    #[test]
    fn handles_are_released_when_tracker_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"clip").unwrap();

        let mut tracker = ResourceTracker::new(FilePreviewProvider::default());
        let ids = tracker.add_files([MediaFile::new(&path, 4)]);
        assert_eq!(ids.len(), 1);
        assert_eq!(tracker.provider().live(), 1);
        assert_eq!(
            tracker.active().map(|file| file.preview().url().scheme()),
            Some("file")
        );

        tracker.clear_all();
        assert_eq!(tracker.provider().live(), 0);
    }

    #[test]
    fn missing_file_is_not_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ResourceTracker::new(FilePreviewProvider::default());
        let ids = tracker.add_files([MediaFile::new(dir.path().join("gone.mp4"), 0)]);
        assert!(ids.is_empty());
        assert_eq!(tracker.provider().live(), 0);
    }
}
