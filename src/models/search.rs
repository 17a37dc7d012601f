//! Search requests, index queries, and result shapes.

use super::{AssetId, Embedding, FaceId, OwnerScope};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result cap used when the caller does not provide one.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Search mode for image search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Detect faces and search for each face independently.
    Face,
    /// Search by whole-image embedding.
    #[serde(alias = "similar")]
    Content,
}

impl SearchMode {
    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Face => "face",
            Self::Content => "content",
        }
    }

    /// Parses a mode string, case-insensitively.
    ///
    /// `similar` is accepted as an alias of `content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for any other value.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "face" => Ok(Self::Face),
            "content" | "similar" => Ok(Self::Content),
            other => Err(Error::InvalidInput(format!(
                "invalid search mode '{other}' (expected 'face' or 'content')"
            ))),
        }
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bytes of an uploaded example image.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// The encoded image (JPEG, PNG, ...).
    pub bytes: Vec<u8>,
    /// Name the client uploaded the file under, used for logging only.
    pub original_name: String,
}

/// A validated image search request.
#[derive(Debug, Clone)]
pub struct ImageSearchRequest {
    /// Face or content search.
    pub mode: SearchMode,
    /// The example image.
    pub image: ImagePayload,
    /// Owners whose assets may be returned.
    pub owner_scope: OwnerScope,
    /// Upper bound on index results per query.
    pub max_results: usize,
}

impl ImageSearchRequest {
    /// Builds a request from caller input.
    ///
    /// The mode and the payload are validated here so that nothing reaches a
    /// collaborator for a request that can never succeed. `max_results` is
    /// clamped to at least 1 and defaults to [`DEFAULT_MAX_RESULTS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown mode or an empty image.
    pub fn new(
        mode: &str,
        bytes: Vec<u8>,
        original_name: impl Into<String>,
        owner_scope: OwnerScope,
        max_results: Option<usize>,
    ) -> Result<Self> {
        let mode = SearchMode::parse(mode)?;
        if bytes.is_empty() {
            return Err(Error::InvalidInput("image payload is empty".to_string()));
        }

        Ok(Self {
            mode,
            image: ImagePayload {
                bytes,
                original_name: original_name.into(),
            },
            owner_scope,
            max_results: max_results.unwrap_or(DEFAULT_MAX_RESULTS).max(1),
        })
    }
}

/// A k-nearest-neighbor query against the face index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Owners whose vectors are candidates.
    pub owner_scope: OwnerScope,
    /// The query vector.
    pub embedding: Embedding,
    /// Maximum number of hits to return.
    pub max_results: usize,
    /// Distance ceiling in the index's native metric (lower is closer).
    pub max_distance: f32,
}

impl SearchQuery {
    /// Creates a validated query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `max_results` is zero or
    /// `max_distance` is negative or not finite.
    pub fn new(
        owner_scope: OwnerScope,
        embedding: Embedding,
        max_results: usize,
        max_distance: f32,
    ) -> Result<Self> {
        if max_results == 0 {
            return Err(Error::InvalidInput(
                "max_results must be a positive integer".to_string(),
            ));
        }
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(Error::InvalidInput(format!(
                "max_distance must be a non-negative number, got {max_distance}"
            )));
        }

        Ok(Self {
            owner_scope,
            embedding,
            max_results,
            max_distance,
        })
    }
}

/// One nearest-neighbor match from the face index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched face record.
    pub face_id: FaceId,
    /// Distance to the query vector.
    pub distance: f32,
}

/// Pagination window for ranked searches (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: usize,
    /// Items per page.
    pub size: usize,
}

impl Page {
    /// The first page of the given size.
    #[must_use]
    pub const fn first(size: usize) -> Self {
        Self { page: 1, size }
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// One asset from a ranked whole-image search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    /// The matched asset.
    pub asset_id: AssetId,
    /// Distance to the query, when the index reports it.
    pub distance: Option<f32>,
    /// File name, when the index returns it alongside the hit.
    pub display_name: Option<String>,
}

/// A page of ranked whole-image search results, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    /// Ranked items.
    pub items: Vec<RankedItem>,
}

/// Similarity scores attached to a result entry.
///
/// All fields are optional. Content search leaves them unset because whole
/// image distances are only meaningful as a ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityScores {
    /// Overall score in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<f32>,
    /// Face similarity in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<f32>,
    /// Content similarity in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<f32>,
}

/// One asset inside a result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMember {
    /// The asset.
    pub asset_id: AssetId,
    /// Original file name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A group of matched assets.
///
/// In face mode there is one entry per detected face; in content mode there
/// is at most one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    /// Person name for face matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
    /// Similarity scores.
    pub scores: SimilarityScores,
    /// Matched assets, closest first.
    pub members: Vec<ResultMember>,
}

/// What the orchestrator actually did for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDiagnostics {
    /// Detection threshold that produced the faces (face mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_min_score: Option<f32>,
    /// Number of faces detected (face mode only).
    pub faces_detected: usize,
    /// Distance ceiling used for each face, in detection order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub used_max_distances: Vec<f32>,
    /// Total number of vector index queries issued.
    pub index_queries: usize,
}

/// Response of an image search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchResponse {
    /// Result entries in emission order.
    pub results: Vec<ResultEntry>,
    /// Ladder and query bookkeeping.
    pub diagnostics: SearchDiagnostics,
}
