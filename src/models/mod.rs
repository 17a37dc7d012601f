//! Data models for lenscape.
//!
//! This module contains all the core data structures used throughout the system.
//! Everything here is request-scoped: built fresh per call and never cached by
//! the services.

mod asset;
mod audit;
mod embedding;
mod face;
mod ids;
mod rating;
mod search;
mod tags;

pub use asset::{
    AssetRecord, AssetSummary, AssetType, FaceRecord, PersonRef, SequencableAsset,
};
pub use audit::{PersonAssetPath, PersonPaths};
pub use embedding::Embedding;
pub use face::{BoundingBox, FaceDetection, FaceDetectionResult};
pub use ids::{AssetId, FaceId, OwnerId, OwnerScope, PersonId};
pub use rating::{PersonRating, RatingDimension, RatingRecord};
pub use search::{
    DEFAULT_MAX_RESULTS, ImagePayload, ImageSearchRequest, ImageSearchResponse, Page, RankedItem,
    RankedPage, ResultEntry, ResultMember, SearchDiagnostics, SearchHit, SearchMode, SearchQuery,
    SimilarityScores,
};
pub use tags::{TagLabels, TagSkill, TagType};
