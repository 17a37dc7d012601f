//! # Lenscape
//!
//! Image similarity search and embedding-based sequencing for photo catalogs.
//!
//! Lenscape sits on top of an existing media catalog. It turns an uploaded
//! example image into ranked matches from a vector index, and turns a bag of
//! assets with precomputed embeddings into a smooth browsing order.
//!
//! ## Features
//!
//! - Face search with a fallback ladder over detection confidence and match distance
//! - Whole-image (content) similarity search
//! - Sequencing by nearest-neighbor chaining or centroid projection
//! - Pluggable collaborators (`EmbeddingClient`, `VectorIndex`, `EntityLookup`)
//! - Flat-file person ratings and tag taxonomy stores
//! - An audit of people whose assets span several directories
//!
//! ## Example
//!
//! ```rust,ignore
//! use lenscape::{ImageSearchRequest, ImageSearchService, LenscapeConfig, OwnerScope};
//!
//! let config = LenscapeConfig::load(None)?;
//! let service = ImageSearchService::new(
//!     config.image_search_settings(),
//!     config.storage.upload_dir(),
//!     ml,
//!     index,
//!     lookup,
//! );
//! let request = ImageSearchRequest::new("face", bytes, "upload.jpg", OwnerScope::single("user-1"), Some(20))?;
//! let response = service.search(&request)?;
//! for entry in &response.results {
//!     println!("{:?}: {} assets", entry.display_label, entry.members.len());
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod embedding;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::LenscapeConfig;
pub use embedding::EmbeddingClient;
pub use models::{
    AssetId, Embedding, ImageSearchRequest, ImageSearchResponse, OwnerId, OwnerScope,
    ResultEntry, SearchMode, SequencableAsset,
};
pub use services::{ImageSearchService, OrganizeService, PeopleAuditService, Sequencer};
pub use storage::traits::{AssetCatalog, EmbeddingStore, EntityLookup, VectorIndex};

/// Error type for lenscape operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown search mode, empty image payload, out-of-range config values |
/// | `DimensionMismatch` | Query and index disagree on embedding length, or a sequencing call mixes lengths |
/// | `OperationFailed` | Machine-learning service, vector index, lookup, or file I/O failures |
/// | `NotFound` | An explicitly requested file does not exist |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - The search mode is not `face`, `content` or `similar`
    /// - The uploaded image payload is empty
    /// - A search query asks for zero results
    /// - Configuration values are out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two embeddings that must share a dimension do not.
    ///
    /// Never silently truncated. The fallback ladder does not mask it.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension required by the index or by the first vector seen.
        expected: usize,
        /// The dimension actually supplied.
        actual: usize,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - The machine-learning service errors or times out
    /// - The vector index or entity lookup fails
    /// - Filesystem I/O errors occur (scratch image, stores, catalog)
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A required resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for lenscape operations.
pub type Result<T> = std::result::Result<T, Error>;
