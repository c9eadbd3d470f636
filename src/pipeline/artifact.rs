//! The temporary artifact: an uploaded document on local disk.
//!
//! Converters need a file-system path, and many pick their parser from the
//! file extension, so every upload is written to `<uuid>.<ext>` inside the
//! configured temporary directory. [`TemporaryArtifact`] owns that path and
//! deletes it exactly once: either through [`TemporaryArtifact::release`] or,
//! if the owner is dropped first (early return, panic, cancelled request),
//! from `Drop`.
//!
//! Deletion is best-effort. A file that is already gone is fine; any other
//! failure is logged and swallowed so it can never replace the result the
//! request is about to return.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A uniquely named file holding one request's upload.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    extension: String,
    released: bool,
}

impl TemporaryArtifact {
    /// Reserve a fresh name for an artifact with the given extension.
    ///
    /// No file is created; the guard is armed immediately so whatever the
    /// caller writes to [`path`](Self::path) is removed on drop.
    pub(crate) fn allocate(dir: &Path, extension: &str) -> Self {
        let name = format!("{}.{}", Uuid::new_v4().simple(), extension);
        Self {
            path: dir.join(name),
            extension: extension.to_string(),
            released: false,
        }
    }

    /// Absolute location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension derived from the uploaded filename, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Delete the artifact now.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temporary artifact {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Temporary artifact {} already gone", self.path.display());
            }
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary artifact"
            ),
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        // A single unlink; done inline even when dropped on a runtime worker.
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn name_is_uuid_plus_extension() {
        let dir = TempDir::new().unwrap();
        let artifact = TemporaryArtifact::allocate(dir.path(), "docx");

        let name = artifact.path().file_name().unwrap().to_str().unwrap();
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "docx");
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(artifact.extension(), "docx");
        assert!(artifact.path().starts_with(dir.path()));
    }

    #[test]
    fn names_do_not_repeat() {
        let dir = TempDir::new().unwrap();
        let a = TemporaryArtifact::allocate(dir.path(), "pdf");
        let b = TemporaryArtifact::allocate(dir.path(), "pdf");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn release_deletes_file() {
        let dir = TempDir::new().unwrap();
        let artifact = TemporaryArtifact::allocate(dir.path(), "txt");
        std::fs::write(artifact.path(), b"hello").unwrap();
        assert_eq!(entries(dir.path()), 1);

        artifact.release();
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn drop_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = {
            let artifact = TemporaryArtifact::allocate(dir.path(), "txt");
            std::fs::write(artifact.path(), b"hello").unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let artifact = TemporaryArtifact::allocate(dir.path(), "txt");
        // Never written: release must not panic.
        artifact.release();
    }

    #[test]
    fn deletes_only_once() {
        let dir = TempDir::new().unwrap();
        let mut artifact = TemporaryArtifact::allocate(dir.path(), "txt");
        std::fs::write(artifact.path(), b"first").unwrap();
        artifact.remove();

        // A new file at the same path after release must survive the drop.
        std::fs::write(artifact.path(), b"second").unwrap();
        let path = artifact.path().to_path_buf();
        drop(artifact);
        assert!(path.exists());
    }

    #[test]
    fn failure_to_delete_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let artifact = TemporaryArtifact::allocate(dir.path(), "d");
        // A directory at the artifact path makes remove_file fail with
        // something other than NotFound.
        std::fs::create_dir(artifact.path()).unwrap();
        let path = artifact.path().to_path_buf();
        artifact.release();
        assert!(path.exists());
    }
}
