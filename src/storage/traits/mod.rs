//! Collaborator traits.
//!
//! The search and organize services only depend on these seams. Methods take
//! `&self` so implementations can be shared via `Arc<dyn Trait>`.

mod catalog;
mod lookup;
mod vector;

pub use catalog::{AssetCatalog, EmbeddingStore};
pub use lookup::EntityLookup;
pub use vector::VectorIndex;
