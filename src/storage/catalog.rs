//! JSON-file catalog.
//!
//! A brute-force O(n) stand-in for a real catalog database and vector
//! index. The whole document is loaded into memory on open; every query
//! scans it and ranks by cosine distance.
//!
//! ```json
//! {
//!   "assets": [{"id": "a1", "ownerId": "u1", "type": "IMAGE",
//!               "originalFileName": "a.jpg", "originalPath": "/lib/a.jpg",
//!               "embedding": [0.1, 0.2]}],
//!   "faces":  [{"id": "f1", "assetId": "a1", "personId": "p1", "embedding": [0.3, 0.4]}],
//!   "people": [{"id": "p1", "name": "Ada"}]
//! }
//! ```

use crate::models::{
    AssetId, AssetRecord, AssetType, Embedding, FaceId, FaceRecord, OwnerId, OwnerScope, Page,
    PersonAssetPath, PersonId, PersonRef, RankedItem, RankedPage, SearchHit, SearchQuery,
};
use crate::storage::traits::{AssetCatalog, EmbeddingStore, EntityLookup, VectorIndex};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// One asset in the catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAsset {
    /// Asset identifier.
    pub id: AssetId,
    /// Owning principal.
    pub owner_id: OwnerId,
    /// Category.
    #[serde(default, rename = "type")]
    pub asset_type: AssetType,
    /// Original file name.
    #[serde(default)]
    pub original_file_name: Option<String>,
    /// Original path in the library.
    #[serde(default)]
    pub original_path: String,
    /// Whole-image embedding.
    #[serde(default)]
    pub embedding: Option<Embedding>,
}

/// One detected face in the catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFace {
    /// Face identifier.
    pub id: FaceId,
    /// Asset the face was found in.
    pub asset_id: AssetId,
    /// Assigned person.
    #[serde(default)]
    pub person_id: Option<PersonId>,
    /// Face embedding.
    pub embedding: Embedding,
}

/// One person in the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPerson {
    /// Person identifier.
    pub id: PersonId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// The on-disk catalog document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Assets in catalog order.
    #[serde(default)]
    pub assets: Vec<CatalogAsset>,
    /// Faces.
    #[serde(default)]
    pub faces: Vec<CatalogFace>,
    /// People.
    #[serde(default)]
    pub people: Vec<CatalogPerson>,
}

/// In-memory catalog loaded from a JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    document: CatalogDocument,
    asset_positions: HashMap<AssetId, usize>,
    face_positions: HashMap<FaceId, usize>,
    person_positions: HashMap<PersonId, usize>,
}

impl JsonCatalog {
    /// Loads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or an error if
    /// it cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("catalog {}", path.display())));
        }
        let content = fs::read_to_string(path).map_err(|e| Error::operation("read_catalog", e))?;
        let document: CatalogDocument =
            serde_json::from_str(&content).map_err(|e| Error::operation("parse_catalog", e))?;

        let catalog = Self::from_document(document);
        tracing::debug!(
            path = %path.display(),
            assets = catalog.document.assets.len(),
            faces = catalog.document.faces.len(),
            people = catalog.document.people.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Builds a catalog from an in-memory document.
    #[must_use]
    pub fn from_document(document: CatalogDocument) -> Self {
        let asset_positions = document
            .assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        let face_positions = document
            .faces
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        let person_positions = document
            .people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        Self {
            document,
            asset_positions,
            face_positions,
            person_positions,
        }
    }

    /// Returns the underlying document.
    #[must_use]
    pub const fn document(&self) -> &CatalogDocument {
        &self.document
    }

    fn asset(&self, id: &AssetId) -> Option<&CatalogAsset> {
        self.asset_positions.get(id).map(|&i| &self.document.assets[i])
    }

    fn in_scope(&self, asset_id: &AssetId, scope: &OwnerScope) -> bool {
        self.asset(asset_id)
            .is_some_and(|asset| scope.contains(&asset.owner_id))
    }

    fn person_ref(&self, id: &PersonId) -> PersonRef {
        let name = self
            .person_positions
            .get(id)
            .and_then(|&i| self.document.people[i].name.clone());
        PersonRef {
            id: id.clone(),
            name,
        }
    }
}

/// Sorts `(item, distance)` pairs closest first, keeping catalog order on ties.
fn sort_by_distance<T>(scored: &mut [(T, f32)]) {
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
}

fn record_of(asset: &CatalogAsset) -> AssetRecord {
    AssetRecord {
        id: asset.id.clone(),
        owner_id: asset.owner_id.clone(),
        asset_type: asset.asset_type,
        original_file_name: asset.original_file_name.clone(),
        original_path: asset.original_path.clone(),
    }
}

impl VectorIndex for JsonCatalog {
    fn face_dimensions(&self) -> Option<usize> {
        self.document.faces.first().map(|f| f.embedding.dimensions())
    }

    fn image_dimensions(&self) -> Option<usize> {
        self.document
            .assets
            .iter()
            .find_map(|a| a.embedding.as_ref().map(Embedding::dimensions))
    }

    fn search_faces(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let mut scored = Vec::new();
        for face in &self.document.faces {
            if !self.in_scope(&face.asset_id, &query.owner_scope) {
                continue;
            }
            let distance = query.embedding.cosine_distance(&face.embedding)?;
            if distance <= query.max_distance {
                scored.push((&face.id, distance));
            }
        }

        sort_by_distance(&mut scored);
        Ok(scored
            .into_iter()
            .take(query.max_results)
            .map(|(id, distance)| SearchHit {
                face_id: id.clone(),
                distance,
            })
            .collect())
    }

    fn search_images_ranked(
        &self,
        page: Page,
        owner_scope: &OwnerScope,
        embedding: &Embedding,
    ) -> Result<RankedPage> {
        let mut scored = Vec::new();
        for asset in &self.document.assets {
            let Some(stored) = asset.embedding.as_ref() else {
                continue;
            };
            if !owner_scope.contains(&asset.owner_id) {
                continue;
            }
            scored.push((asset, embedding.cosine_distance(stored)?));
        }

        sort_by_distance(&mut scored);
        let items = scored
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .map(|(asset, distance)| RankedItem {
                asset_id: asset.id.clone(),
                distance: Some(distance),
                display_name: asset.original_file_name.clone(),
            })
            .collect();
        Ok(RankedPage { items })
    }
}

impl EntityLookup for JsonCatalog {
    fn resolve_faces(&self, ids: &[FaceId]) -> Result<Vec<FaceRecord>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.face_positions.get(id))
            .map(|&i| {
                let face = &self.document.faces[i];
                FaceRecord {
                    id: face.id.clone(),
                    asset_id: face.asset_id.clone(),
                    person: face.person_id.as_ref().map(|p| self.person_ref(p)),
                }
            })
            .collect())
    }

    fn resolve_assets(&self, ids: &[AssetId]) -> Result<Vec<AssetRecord>> {
        Ok(ids.iter().filter_map(|id| self.asset(id)).map(record_of).collect())
    }
}

impl AssetCatalog for JsonCatalog {
    fn unassigned_assets(&self, owner: &OwnerId) -> Result<Vec<AssetRecord>> {
        let assigned: HashSet<&AssetId> = self
            .document
            .faces
            .iter()
            .filter(|f| f.person_id.is_some())
            .map(|f| &f.asset_id)
            .collect();

        Ok(self
            .document
            .assets
            .iter()
            .filter(|a| &a.owner_id == owner && !assigned.contains(&a.id))
            .map(record_of)
            .collect())
    }

    fn person_asset_paths(&self, owner: &OwnerId) -> Result<Vec<PersonAssetPath>> {
        Ok(self
            .document
            .faces
            .iter()
            .filter_map(|face| {
                let person_id = face.person_id.as_ref()?;
                let asset = self.asset(&face.asset_id).filter(|a| &a.owner_id == owner)?;
                Some(PersonAssetPath {
                    person_id: person_id.clone(),
                    person_name: self.person_ref(person_id).name,
                    owner_id: asset.owner_id.clone(),
                    original_path: asset.original_path.clone(),
                })
            })
            .collect())
    }
}

impl EmbeddingStore for JsonCatalog {
    fn image_embeddings(&self, ids: &[AssetId]) -> Result<Vec<(AssetId, Embedding)>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.asset(id))
            .filter_map(|a| a.embedding.clone().map(|e| (a.id.clone(), e)))
            .collect())
    }
}
