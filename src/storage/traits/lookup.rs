//! Batch entity lookups.

use crate::Result;
use crate::models::{AssetId, AssetRecord, FaceId, FaceRecord};

/// Resolves index hits back to catalog entities.
///
/// Both calls are batch calls. Ids that do not exist are absent from the
/// output; result order is unspecified.
pub trait EntityLookup: Send + Sync {
    /// Resolves faces, including the person each face is assigned to.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn resolve_faces(&self, ids: &[FaceId]) -> Result<Vec<FaceRecord>>;

    /// Resolves asset metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn resolve_assets(&self, ids: &[AssetId]) -> Result<Vec<AssetRecord>>;
}
