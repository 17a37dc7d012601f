//! Catalog assets and the records lookups resolve to.

use super::{AssetId, Embedding, FaceId, OwnerId, PersonId};
use serde::{Deserialize, Serialize};

/// Asset category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    /// Still image.
    #[default]
    Image,
    /// Video clip.
    Video,
    /// Audio file.
    Audio,
    /// Anything else.
    Other,
}

impl AssetType {
    /// Returns the type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::Other => "OTHER",
        }
    }
}

/// An asset that can take part in sequencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencableAsset {
    /// Asset identifier.
    pub id: AssetId,
    /// Category.
    #[serde(default, alias = "type")]
    pub category: AssetType,
    /// Original file name.
    #[serde(default, alias = "originalFileName")]
    pub display_name: String,
    /// Original path in the library.
    #[serde(default, alias = "originalPath")]
    pub path: String,
    /// Whole-image embedding, when one has been computed.
    #[serde(default)]
    pub embedding: Option<Embedding>,
}

impl SequencableAsset {
    /// Strips the embedding, keeping the presentable fields.
    #[must_use]
    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            id: self.id.clone(),
            asset_type: self.category,
            original_file_name: self.display_name.clone(),
            original_path: self.path.clone(),
        }
    }
}

/// Presentable asset fields returned by organize listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    /// Asset identifier.
    pub id: AssetId,
    /// Category.
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Original file name.
    pub original_file_name: String,
    /// Original path in the library.
    pub original_path: String,
}

/// Asset metadata as returned by entity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Asset identifier.
    pub id: AssetId,
    /// Owning principal.
    pub owner_id: OwnerId,
    /// Category.
    #[serde(default, rename = "type")]
    pub asset_type: AssetType,
    /// Original file name, if recorded.
    #[serde(default)]
    pub original_file_name: Option<String>,
    /// Original path in the library.
    #[serde(default)]
    pub original_path: String,
}

/// A person a face has been assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    /// Person identifier.
    pub id: PersonId,
    /// Display name; empty names are treated as unnamed.
    #[serde(default)]
    pub name: Option<String>,
}

impl PersonRef {
    /// Returns the name when it is present and not blank.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// A stored face as returned by entity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRecord {
    /// Face identifier.
    pub id: FaceId,
    /// The asset the face was found in.
    pub asset_id: AssetId,
    /// The person the face is assigned to, if any.
    #[serde(default)]
    pub person: Option<PersonRef>,
}
