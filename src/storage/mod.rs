//! Storage layer.
//!
//! - **Traits**: the collaborator seams the services depend on
//! - **Catalog**: a JSON-file implementation of those seams
//! - **Ratings** and **Tags**: small flat-file document stores
//! - **Scratch**: transient files for uploaded images

// Allow cast precision loss for distance calculations where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]

pub mod catalog;
pub mod ratings;
pub mod scratch;
pub mod tags;
pub mod traits;

pub use catalog::{CatalogAsset, CatalogDocument, CatalogFace, CatalogPerson, JsonCatalog};
pub use ratings::PersonRatingStore;
pub use scratch::ScratchImage;
pub use tags::TagTaxonomyStore;
pub use traits::{AssetCatalog, EmbeddingStore, EntityLookup, VectorIndex};
