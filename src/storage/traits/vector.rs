//! Vector index trait.
//!
//! Provides the k-nearest-neighbor seam used by image search. Two vector
//! spaces are queried: per-face embeddings and whole-image embeddings.
//! Their dimensionality is model-specific and reported by the index so a
//! query can be rejected before it is issued.

use crate::Result;
use crate::models::{Embedding, OwnerScope, Page, RankedPage, SearchHit, SearchQuery};

/// Trait for vector index backends.
///
/// # Implementor Notes
///
/// - Hits are returned closest first; the caller never re-sorts them.
/// - A query whose dimension disagrees with the stored vectors is an
///   [`Error::DimensionMismatch`](crate::Error::DimensionMismatch), never a
///   silent truncation.
/// - An empty result is `Ok(vec![])`, not an error.
pub trait VectorIndex: Send + Sync {
    /// Dimensionality of stored face embeddings, if known.
    fn face_dimensions(&self) -> Option<usize>;

    /// Dimensionality of stored whole-image embeddings, if known.
    fn image_dimensions(&self) -> Option<usize>;

    /// Finds faces within `query.max_distance`, at most `query.max_results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried.
    fn search_faces(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;

    /// Ranks whole-image embeddings by distance to `embedding` and returns
    /// one page of assets owned by `owner_scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried.
    fn search_images_ranked(
        &self,
        page: Page,
        owner_scope: &OwnerScope,
        embedding: &Embedding,
    ) -> Result<RankedPage>;
}
