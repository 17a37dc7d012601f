//! Result assembly.
//!
//! Joins raw index hits back to catalog entities and builds
//! [`ResultEntry`] values. An assembler lives for one request and caches
//! every lookup it makes, so each distinct id is resolved at most once.

use crate::models::{
    AssetId, AssetRecord, FaceId, FaceRecord, RankedItem, ResultEntry, ResultMember, SearchHit,
    SimilarityScores,
};
use crate::storage::traits::EntityLookup;
use crate::Result;
use std::collections::{HashMap, HashSet};

/// Request-scoped joiner from hits to result entries.
pub struct ResultAssembler<'a> {
    lookup: &'a dyn EntityLookup,
    /// `None` marks an id that was looked up and does not exist.
    faces: HashMap<FaceId, Option<FaceRecord>>,
    assets: HashMap<AssetId, Option<AssetRecord>>,
    lookup_calls: usize,
}

impl<'a> ResultAssembler<'a> {
    /// Creates an assembler with empty caches.
    #[must_use]
    pub fn new(lookup: &'a dyn EntityLookup) -> Self {
        Self {
            lookup,
            faces: HashMap::new(),
            assets: HashMap::new(),
            lookup_calls: 0,
        }
    }

    /// Number of batch lookups issued so far.
    #[must_use]
    pub const fn lookup_calls(&self) -> usize {
        self.lookup_calls
    }

    /// Builds the entry for one detected face.
    ///
    /// Returns `None` when no hit resolves. The overall (and face) score is
    /// `max(0, 1 - d)` for the closest hit's distance `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn face_entry(&mut self, hits: &[SearchHit]) -> Result<Option<ResultEntry>> {
        let Some(closest) = hits.first() else {
            return Ok(None);
        };

        let face_ids: Vec<FaceId> = hits.iter().map(|h| h.face_id.clone()).collect();
        self.resolve_faces(&face_ids)?;

        let resolved: Vec<FaceRecord> = face_ids
            .iter()
            .filter_map(|id| self.faces.get(id).cloned().flatten())
            .collect();
        if resolved.is_empty() {
            return Ok(None);
        }

        let asset_ids: Vec<AssetId> = resolved.iter().map(|f| f.asset_id.clone()).collect();
        self.resolve_assets(&asset_ids)?;

        let display_label = resolved
            .iter()
            .find_map(|f| f.person.as_ref().and_then(|p| p.display_name()))
            .map(str::to_string);

        let members = resolved
            .iter()
            .map(|face| ResultMember {
                asset_id: face.asset_id.clone(),
                display_name: self.file_name(&face.asset_id),
            })
            .collect();

        let score = (1.0 - closest.distance).max(0.0);
        Ok(Some(ResultEntry {
            display_label,
            scores: SimilarityScores {
                overall: Some(score),
                face: Some(score),
                content: None,
            },
            members,
        }))
    }

    /// Builds the single entry for a content search.
    ///
    /// Items whose asset does not resolve are dropped; returns `None` when
    /// nothing is left. Scores stay unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn content_entry(&mut self, items: &[RankedItem]) -> Result<Option<ResultEntry>> {
        let asset_ids: Vec<AssetId> = items.iter().map(|i| i.asset_id.clone()).collect();
        self.resolve_assets(&asset_ids)?;

        let members: Vec<ResultMember> = items
            .iter()
            .filter(|item| matches!(self.assets.get(&item.asset_id), Some(Some(_))))
            .map(|item| ResultMember {
                asset_id: item.asset_id.clone(),
                display_name: item
                    .display_name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .or_else(|| self.file_name(&item.asset_id)),
            })
            .collect();

        if members.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResultEntry {
            display_label: None,
            scores: SimilarityScores::default(),
            members,
        }))
    }

    fn file_name(&self, id: &AssetId) -> Option<String> {
        self.assets
            .get(id)
            .and_then(Option::as_ref)
            .and_then(|a| a.original_file_name.clone())
            .filter(|n| !n.is_empty())
    }

    fn resolve_faces(&mut self, ids: &[FaceId]) -> Result<()> {
        let pending = uncached(ids, &self.faces);
        if pending.is_empty() {
            return Ok(());
        }

        self.lookup_calls += 1;
        let records = self.lookup.resolve_faces(&pending)?;
        for id in pending {
            self.faces.entry(id).or_insert(None);
        }
        for record in records {
            self.faces.insert(record.id.clone(), Some(record));
        }
        Ok(())
    }

    fn resolve_assets(&mut self, ids: &[AssetId]) -> Result<()> {
        let pending = uncached(ids, &self.assets);
        if pending.is_empty() {
            return Ok(());
        }

        self.lookup_calls += 1;
        let records = self.lookup.resolve_assets(&pending)?;
        for id in pending {
            self.assets.entry(id).or_insert(None);
        }
        for record in records {
            self.assets.insert(record.id.clone(), Some(record));
        }
        Ok(())
    }
}

/// Distinct ids not yet in `cache`, in first-seen order.
fn uncached<K, V>(ids: &[K], cache: &HashMap<K, V>) -> Vec<K>
where
    K: Clone + Eq + std::hash::Hash,
{
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !cache.contains_key(*id) && seen.insert(*id))
        .cloned()
        .collect()
}
