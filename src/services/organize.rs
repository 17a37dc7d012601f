//! Organize: sequencing of an owner's unassigned assets.

use super::sequencer::Sequencer;
use crate::models::{AssetId, AssetSummary, Embedding, OwnerId, SequencableAsset};
use crate::storage::traits::{AssetCatalog, EmbeddingStore};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Lists unassigned assets in browsing order.
pub struct OrganizeService {
    catalog: Arc<dyn AssetCatalog>,
    embeddings: Arc<dyn EmbeddingStore>,
    sequencer: Sequencer,
}

impl OrganizeService {
    /// Creates an organize service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        embeddings: Arc<dyn EmbeddingStore>,
        sequencer: Sequencer,
    ) -> Self {
        Self {
            catalog,
            embeddings,
            sequencer,
        }
    }

    /// Returns `owner`'s unassigned assets, similar assets adjacent.
    ///
    /// Embeddings are fetched in one bulk call. An embedding that is empty or
    /// holds a non-finite value counts as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or embedding store fails, or if the
    /// stored embeddings disagree on dimension.
    #[instrument(skip(self), fields(operation = "organize", owner = %owner))]
    pub fn unassigned_assets(&self, owner: &OwnerId) -> Result<Vec<AssetSummary>> {
        let records = self.catalog.unassigned_assets(owner)?;
        tracing::debug!(assets = records.len(), "Found unassigned assets");

        let ids: Vec<AssetId> = records.iter().map(|r| r.id.clone()).collect();
        let mut embeddings: HashMap<AssetId, Embedding> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.embeddings
                .image_embeddings(&ids)?
                .into_iter()
                .filter(|(id, embedding)| {
                    let usable = !embedding.is_empty() && embedding.is_finite();
                    if !usable {
                        tracing::debug!(asset_id = %id, "Discarding unusable embedding");
                    }
                    usable
                })
                .collect()
        };

        let assets: Vec<SequencableAsset> = records
            .into_iter()
            .map(|record| SequencableAsset {
                embedding: embeddings.remove(&record.id),
                id: record.id,
                category: record.asset_type,
                display_name: record.original_file_name.unwrap_or_default(),
                path: record.original_path,
            })
            .collect();

        Ok(self
            .sequencer
            .arrange(&assets)?
            .into_iter()
            .map(SequencableAsset::summary)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetRecord, AssetType, PersonAssetPath};

    struct Fixture {
        records: Vec<AssetRecord>,
        embeddings: Vec<(AssetId, Embedding)>,
    }

    impl AssetCatalog for Fixture {
        fn unassigned_assets(&self, owner: &OwnerId) -> Result<Vec<AssetRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|r| &r.owner_id == owner)
                .cloned()
                .collect())
        }

        fn person_asset_paths(&self, _owner: &OwnerId) -> Result<Vec<PersonAssetPath>> {
            Ok(Vec::new())
        }
    }

    impl EmbeddingStore for Fixture {
        fn image_embeddings(&self, ids: &[AssetId]) -> Result<Vec<(AssetId, Embedding)>> {
            Ok(self
                .embeddings
                .iter()
                .filter(|(id, _)| ids.contains(id))
                .cloned()
                .collect())
        }
    }

    fn record(id: &str) -> AssetRecord {
        AssetRecord {
            id: AssetId::new(id),
            owner_id: OwnerId::new("u1"),
            asset_type: AssetType::Image,
            original_file_name: Some(format!("{id}.jpg")),
            original_path: format!("/library/{id}.jpg"),
        }
    }

    fn service(fixture: Fixture) -> OrganizeService {
        let fixture = Arc::new(fixture);
        OrganizeService::new(fixture.clone(), fixture, Sequencer::default())
    }

    #[test]
    fn test_orders_and_appends_missing() {
        let service = service(Fixture {
            records: vec![record("A"), record("none"), record("B"), record("C"), record("bad")],
            embeddings: vec![
                (AssetId::new("A"), Embedding::new(vec![1.0, 0.0])),
                (AssetId::new("B"), Embedding::new(vec![0.0, 1.0])),
                (AssetId::new("C"), Embedding::new(vec![10.0, 0.0])),
                (AssetId::new("bad"), Embedding::new(vec![f32::NAN, 0.0])),
            ],
        });

        let ordered = service.unassigned_assets(&OwnerId::new("u1")).unwrap();
        let ids: Vec<_> = ordered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "none", "bad"]);
        assert_eq!(ordered[0].original_file_name, "A.jpg");
    }

    #[test]
    fn test_other_owner_sees_nothing() {
        let service = service(Fixture {
            records: vec![record("A")],
            embeddings: Vec::new(),
        });
        assert!(service.unassigned_assets(&OwnerId::new("u2")).unwrap().is_empty());
    }
}
