//! People path audit records.

use super::{OwnerId, PersonId};
use serde::{Deserialize, Serialize};

/// One asset file a person appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonAssetPath {
    /// Person identifier.
    pub person_id: PersonId,
    /// Person name, if any.
    #[serde(default)]
    pub person_name: Option<String>,
    /// Owner of the asset.
    pub owner_id: OwnerId,
    /// Original path of the asset, absolute or relative to the owner's
    /// library folder.
    pub original_path: String,
}

/// A person whose assets are spread over several directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonPaths {
    /// Person identifier.
    pub id: PersonId,
    /// Person name; empty when unnamed.
    pub name: String,
    /// Distinct directories, in first-seen order.
    pub paths: Vec<String>,
}
