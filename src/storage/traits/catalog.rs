//! Catalog queries used by organize and the people audit.

use crate::Result;
use crate::models::{AssetId, AssetRecord, Embedding, OwnerId, PersonAssetPath};

/// Lists catalog assets.
pub trait AssetCatalog: Send + Sync {
    /// Assets owned by `owner` that have no face assigned to a person,
    /// in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn unassigned_assets(&self, owner: &OwnerId) -> Result<Vec<AssetRecord>>;

    /// One row per face of `owner`'s assets that is assigned to a person,
    /// in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn person_asset_paths(&self, owner: &OwnerId) -> Result<Vec<PersonAssetPath>>;
}

/// Bulk access to stored whole-image embeddings.
pub trait EmbeddingStore: Send + Sync {
    /// Fetches embeddings for `ids` in one call.
    ///
    /// Assets without an embedding are absent from the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn image_embeddings(&self, ids: &[AssetId]) -> Result<Vec<(AssetId, Embedding)>>;
}
