//! Tag taxonomy store.

use crate::models::TagLabels;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON-backed tag taxonomy.
#[derive(Debug, Clone)]
pub struct TagTaxonomyStore {
    path: PathBuf,
}

impl TagTaxonomyStore {
    /// Opens the store, writing an empty taxonomy when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::operation("create_tags_dir", e))?;
            }
            let empty = serde_json::to_string(&TagLabels::default())
                .map_err(|e| Error::operation("serialize_tags", e))?;
            fs::write(&path, empty).map_err(|e| Error::operation("create_tags_file", e))?;
        }
        Ok(Self { path })
    }

    /// Reads the taxonomy. Fields that are not lists read as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn load(&self) -> Result<TagLabels> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| Error::operation("read_tags_file", e))?;
        serde_json::from_str(&content).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to parse tag taxonomy");
            Error::operation("parse_tags_file", e)
        })
    }

    /// Writes the taxonomy, dropping skills whose type does not exist.
    ///
    /// Returns the document as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, labels: TagLabels) -> Result<TagLabels> {
        let labels = labels.without_orphan_skills();
        let json = serde_json::to_string_pretty(&labels)
            .map_err(|e| Error::operation("serialize_tags", e))?;
        fs::write(&self.path, json).map_err(|e| Error::operation("write_tags_file", e))?;
        tracing::debug!(
            types = labels.types.len(),
            skills = labels.skills.len(),
            "Saved tag taxonomy"
        );
        Ok(labels)
    }

    /// File location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
