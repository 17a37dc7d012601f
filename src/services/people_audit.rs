//! People path audit: people whose assets are scattered over directories.

use crate::Result;
use crate::models::{OwnerId, PersonId, PersonPaths};
use crate::storage::traits::AssetCatalog;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Finds people whose assets live in more than one directory.
pub struct PeopleAuditService {
    catalog: Arc<dyn AssetCatalog>,
    library_dir: PathBuf,
}

impl PeopleAuditService {
    /// Creates an audit service.
    ///
    /// Relative asset paths are resolved under `<library_dir>/<owner id>`.
    #[must_use]
    pub fn new(catalog: Arc<dyn AssetCatalog>, library_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            library_dir: library_dir.into(),
        }
    }

    /// Groups `owner`'s person-linked assets by parent directory and returns
    /// the people with more than one distinct directory.
    ///
    /// People keep the order in which the catalog first mentions them, and
    /// each person's directories keep first-seen order. Rows with an empty
    /// path are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    #[instrument(skip(self), fields(operation = "people_audit", owner = %owner))]
    pub fn multi_path_people(&self, owner: &OwnerId) -> Result<Vec<PersonPaths>> {
        let rows = self.catalog.person_asset_paths(owner)?;
        let row_count = rows.len();

        let mut people: Vec<PersonPaths> = Vec::new();
        let mut positions: HashMap<PersonId, usize> = HashMap::new();

        for row in rows {
            if row.person_id.as_str().is_empty() || row.original_path.is_empty() {
                continue;
            }
            let directory = self.absolute_directory(&row.owner_id, &row.original_path);

            let position = *positions.entry(row.person_id.clone()).or_insert_with(|| {
                people.push(PersonPaths {
                    id: row.person_id,
                    name: row.person_name.unwrap_or_default(),
                    paths: Vec::new(),
                });
                people.len() - 1
            });
            let paths = &mut people[position].paths;
            if !paths.contains(&directory) {
                paths.push(directory);
            }
        }

        people.retain(|person| person.paths.len() > 1);
        tracing::debug!(
            rows = row_count,
            people = people.len(),
            "People path audit finished"
        );
        Ok(people)
    }

    fn absolute_directory(&self, owner: &OwnerId, original_path: &str) -> String {
        let directory = parent_directory(original_path);
        if is_absolute(directory) {
            return directory.to_string();
        }
        let joined = self.library_dir.join(owner.as_str()).join(directory);
        normalize(&joined).to_string_lossy().into_owned()
    }
}

/// Everything before the last `/` or `\`; empty for a bare file name.
fn parent_directory(path: &str) -> &str {
    path.rfind(['/', '\\']).map_or("", |i| &path[..i])
}

/// Unix root, UNC share, or drive letter.
fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with("\\\\")
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'/' || bytes[2] == b'\\'))
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                out.pop();
            },
            other => out.push(other),
        }
    }
    out
}
