//! Person rating store.
//!
//! Ratings are kept as NDJSON, one record per person. The whole file is
//! loaded on [`PersonRatingStore::open`], mutated in memory, and rewritten on
//! [`PersonRatingStore::flush`]. The last write for a person wins.

use crate::models::{OwnerId, PersonId, PersonRating, RatingRecord};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// NDJSON-backed person ratings.
#[derive(Debug)]
pub struct PersonRatingStore {
    path: PathBuf,
    /// Records in first-seen order.
    records: Vec<RatingRecord>,
    positions: HashMap<PersonId, usize>,
    dirty: bool,
}

impl PersonRatingStore {
    /// Opens the store, creating an empty file when it is missing.
    ///
    /// Lines that are blank or do not parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::operation("create_ratings_dir", e))?;
            }
            fs::write(&path, "").map_err(|e| Error::operation("create_ratings_file", e))?;
        }

        let content =
            fs::read_to_string(&path).map_err(|e| Error::operation("read_ratings_file", e))?;

        let mut store = Self {
            path,
            records: Vec::new(),
            positions: HashMap::new(),
            dirty: false,
        };

        let mut skipped = 0_usize;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RatingRecord>(line) {
                Ok(record) if !record.id.as_str().is_empty() => store.put(record),
                Ok(_) => skipped += 1,
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(line = line_no + 1, error = %e, "Skipping unparseable rating line");
                },
            }
        }

        tracing::debug!(
            path = %store.path.display(),
            records = store.records.len(),
            skipped,
            "Loaded person ratings"
        );
        Ok(store)
    }

    /// Records a rating for `person`.
    ///
    /// When `owner` is `None` the previous record's owner is kept. Changes
    /// stay in memory until [`flush`](Self::flush).
    pub fn upsert(&mut self, person: PersonId, owner: Option<OwnerId>, rate: PersonRating) {
        let owner_id = owner.or_else(|| self.get(&person).and_then(|r| r.owner_id.clone()));
        self.put(RatingRecord {
            id: person,
            owner_id,
            rate,
            updated_at: Utc::now(),
        });
        self.dirty = true;
    }

    /// Rewrites the file if anything changed since the last flush.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized or the file cannot
    /// be written.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut content = String::new();
        for record in &self.records {
            let line =
                serde_json::to_string(record).map_err(|e| Error::operation("serialize_rating", e))?;
            content.push_str(&line);
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(|e| Error::operation("write_ratings_file", e))?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), count = self.records.len(), "Flushed person ratings");
        Ok(())
    }

    /// Returns the record for `person`.
    #[must_use]
    pub fn get(&self, person: &PersonId) -> Option<&RatingRecord> {
        self.positions.get(person).map(|&i| &self.records[i])
    }

    /// Number of rated persons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nobody has been rated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &RatingRecord> {
        self.records.iter()
    }

    /// Returns true if there are unflushed changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// File location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn put(&mut self, record: RatingRecord) {
        if let Some(&i) = self.positions.get(&record.id) {
            self.records[i] = record;
        } else {
            self.positions.insert(record.id.clone(), self.records.len());
            self.records.push(record);
        }
    }
}
