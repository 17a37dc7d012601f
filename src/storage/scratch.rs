//! Transient working files for uploaded images.

use crate::models::ImagePayload;
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An uploaded image written to disk for the duration of one request.
///
/// The file is removed when the guard is dropped, on every exit path.
/// A removal failure is logged and never propagated.
#[derive(Debug)]
pub struct ScratchImage {
    path: PathBuf,
}

impl ScratchImage {
    /// Writes `image` under `dir` with a unique file name.
    ///
    /// The extension of the uploaded name is kept so that collaborators can
    /// sniff the format from the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn write(dir: &Path, image: &ImagePayload) -> Result<Self> {
        Self::write_with(dir, image, |path, bytes| fs::write(path, bytes))
    }

    fn write_with<W>(dir: &Path, image: &ImagePayload, persist: W) -> Result<Self>
    where
        W: FnOnce(&Path, &[u8]) -> io::Result<()>,
    {
        fs::create_dir_all(dir).map_err(|e| Error::OperationFailed {
            operation: "create_upload_dir".to_string(),
            cause: format!("{}: {e}", dir.display()),
        })?;

        let mut name = uuid::Uuid::new_v4().to_string();
        if let Some(ext) = Path::new(&image.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            name.push('.');
            name.push_str(&ext.to_ascii_lowercase());
        }

        // Owned before the write so a partial file is removed too.
        let scratch = Self {
            path: dir.join(name),
        };
        persist(&scratch.path, &image.bytes).map_err(|e| Error::OperationFailed {
            operation: "write_scratch_image".to_string(),
            cause: format!("{}: {e}", scratch.path.display()),
        })?;

        tracing::debug!(
            path = %scratch.path.display(),
            bytes = image.bytes.len(),
            original_name = %image.original_name,
            "Wrote scratch image"
        );
        Ok(scratch)
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchImage {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch image"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn payload(name: &str) -> ImagePayload {
        ImagePayload {
            bytes: vec![0xFF, 0xD8, 0xFF],
            original_name: name.to_string(),
        }
    }

    #[test]
    fn test_file_exists_until_drop() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchImage::write(dir.path(), &payload("holiday.JPG")).unwrap();
        let path = scratch.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert_eq!(fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF]);

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("upload").join("tmp");
        let scratch = ScratchImage::write(&nested, &payload("x")).unwrap();
        assert!(scratch.path().starts_with(&nested));
        assert!(scratch.path().extension().is_none());
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let result = ScratchImage::write_with(dir.path(), &payload("a.jpg"), |path, bytes| {
            let mut file = fs::File::create(path)?;
            file.write_all(&bytes[..1])?;
            Err(io::Error::other("no space left on device"))
        });

        assert!(matches!(result, Err(Error::OperationFailed { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchImage::write(dir.path(), &payload("a.png")).unwrap();
        fs::remove_file(scratch.path()).unwrap();
        drop(scratch);
    }
}
