//! Integration tests for image search.
//!
//! The machine-learning service and the vector index are replaced by
//! recording fakes so that every call the orchestrator makes can be checked:
//! - detection ladder stops at the first threshold that finds a face
//! - distance ladder returns the results of the first non-empty step only
//! - failures are never retried and never masked as empty results
//! - a lookup failure while joining hits fails the whole request
//! - the scratch image never outlives the request

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use lenscape::embedding::{FaceDetectionOptions, ImageEncodingOptions};
use lenscape::models::{
    AssetId, AssetRecord, BoundingBox, FaceDetection, FaceDetectionResult, FaceId, FaceRecord,
    Page, PersonId, RankedItem, RankedPage, SearchHit, SearchQuery,
};
use lenscape::services::ImageSearchSettings;
use lenscape::storage::{CatalogAsset, CatalogDocument, CatalogFace, CatalogPerson, JsonCatalog};
use lenscape::{
    Embedding, EmbeddingClient, EntityLookup, Error, ImageSearchRequest, ImageSearchService,
    OwnerId, OwnerScope, Result, VectorIndex,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Fakes
// ============================================================================

type DetectFn = dyn Fn(f32) -> Result<Vec<FaceDetection>> + Send + Sync;
type FaceSearchFn = dyn Fn(&SearchQuery) -> Result<Vec<SearchHit>> + Send + Sync;

/// Records every call and whether the scratch image existed at that moment.
struct FakeMl {
    detect: Box<DetectFn>,
    encoded: Result<Embedding>,
    thresholds: Mutex<Vec<f32>>,
    encode_calls: Mutex<usize>,
    seen_paths: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeMl {
    fn detecting(detect: impl Fn(f32) -> Result<Vec<FaceDetection>> + Send + Sync + 'static) -> Self {
        Self {
            detect: Box::new(detect),
            encoded: Ok(Embedding::new(vec![1.0, 0.0])),
            thresholds: Mutex::new(Vec::new()),
            encode_calls: Mutex::new(0),
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    fn encoding(encoded: Result<Embedding>) -> Self {
        Self {
            encoded,
            ..Self::detecting(|_| Ok(Vec::new()))
        }
    }

    fn call_count(&self) -> usize {
        self.thresholds.lock().unwrap().len() + *self.encode_calls.lock().unwrap()
    }

    fn record_path(&self, path: &Path) {
        self.seen_paths
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
    }
}

impl EmbeddingClient for FakeMl {
    fn detect_faces(
        &self,
        image_path: &Path,
        options: &FaceDetectionOptions,
    ) -> Result<FaceDetectionResult> {
        self.record_path(image_path);
        self.thresholds.lock().unwrap().push(options.min_score);
        Ok(FaceDetectionResult {
            faces: (self.detect)(options.min_score)?,
            image_width: 640,
            image_height: 480,
        })
    }

    fn encode_image(&self, image_path: &Path, _options: &ImageEncodingOptions) -> Result<Embedding> {
        self.record_path(image_path);
        *self.encode_calls.lock().unwrap() += 1;
        match &self.encoded {
            Ok(embedding) => Ok(embedding.clone()),
            Err(e) => Err(Error::operation("encode_image", e)),
        }
    }
}

struct FakeIndex {
    face_dimensions: Option<usize>,
    image_dimensions: Option<usize>,
    faces: Box<FaceSearchFn>,
    ranked: Vec<RankedItem>,
    queries: Mutex<Vec<SearchQuery>>,
    ranked_calls: Mutex<Vec<Page>>,
}

impl FakeIndex {
    fn faces(search: impl Fn(&SearchQuery) -> Result<Vec<SearchHit>> + Send + Sync + 'static) -> Self {
        Self {
            face_dimensions: Some(2),
            image_dimensions: Some(2),
            faces: Box::new(search),
            ranked: Vec::new(),
            queries: Mutex::new(Vec::new()),
            ranked_calls: Mutex::new(Vec::new()),
        }
    }

    fn ranked(items: Vec<RankedItem>) -> Self {
        Self {
            ranked: items,
            ..Self::faces(|_| Ok(Vec::new()))
        }
    }

    fn distances(&self) -> Vec<f32> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.max_distance)
            .collect()
    }
}

impl VectorIndex for FakeIndex {
    fn face_dimensions(&self) -> Option<usize> {
        self.face_dimensions
    }

    fn image_dimensions(&self) -> Option<usize> {
        self.image_dimensions
    }

    fn search_faces(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.clone());
        (self.faces)(query)
    }

    fn search_images_ranked(
        &self,
        page: Page,
        _owner_scope: &OwnerScope,
        _embedding: &Embedding,
    ) -> Result<RankedPage> {
        self.ranked_calls.lock().unwrap().push(page);
        Ok(RankedPage {
            items: self.ranked.clone(),
        })
    }
}

/// Lookup whose backing store is down.
#[derive(Default)]
struct FailingLookup {
    calls: Mutex<usize>,
}

impl EntityLookup for FailingLookup {
    fn resolve_faces(&self, _ids: &[FaceId]) -> Result<Vec<FaceRecord>> {
        *self.calls.lock().unwrap() += 1;
        Err(Error::operation("resolve_faces", "catalog database unavailable"))
    }

    fn resolve_assets(&self, _ids: &[AssetId]) -> Result<Vec<AssetRecord>> {
        *self.calls.lock().unwrap() += 1;
        Err(Error::operation("resolve_assets", "catalog database unavailable"))
    }
}

fn catalog() -> JsonCatalog {
    let asset = |id: &str, name: &str| CatalogAsset {
        id: AssetId::new(id),
        owner_id: OwnerId::new("u1"),
        asset_type: lenscape::models::AssetType::Image,
        original_file_name: Some(name.to_string()),
        original_path: format!("/library/{name}"),
        embedding: None,
    };
    let face = |id: &str, asset: &str, person: Option<&str>| CatalogFace {
        id: FaceId::new(id),
        asset_id: AssetId::new(asset),
        person_id: person.map(PersonId::new),
        embedding: Embedding::new(vec![0.0, 1.0]),
    };
    JsonCatalog::from_document(CatalogDocument {
        assets: vec![asset("a1", "one.jpg"), asset("a2", "two.jpg"), asset("a3", "three.jpg")],
        faces: vec![
            face("f1", "a1", None),
            face("f2", "a2", Some("p1")),
            face("f3", "a3", Some("p1")),
        ],
        people: vec![CatalogPerson {
            id: PersonId::new("p1"),
            name: Some("Ada".to_string()),
        }],
    })
}

fn detection(values: Vec<f32>) -> FaceDetection {
    FaceDetection {
        bounding_box: BoundingBox::default(),
        confidence: 0.9,
        embedding: Embedding::new(values),
    }
}

fn hit(id: &str, distance: f32) -> SearchHit {
    SearchHit {
        face_id: FaceId::new(id),
        distance,
    }
}

fn request(mode: &str) -> ImageSearchRequest {
    ImageSearchRequest::new(
        mode,
        vec![0xFF, 0xD8, 0xFF, 0xE0],
        "query.jpg",
        OwnerScope::single("u1"),
        Some(5),
    )
    .unwrap()
}

struct Harness {
    upload: TempDir,
    ml: Arc<FakeMl>,
    index: Arc<FakeIndex>,
    service: ImageSearchService,
}

fn harness(settings: ImageSearchSettings, ml: FakeMl, index: FakeIndex) -> Harness {
    harness_with_lookup(settings, ml, index, Arc::new(catalog()))
}

fn harness_with_lookup(
    settings: ImageSearchSettings,
    ml: FakeMl,
    index: FakeIndex,
    lookup: Arc<dyn EntityLookup>,
) -> Harness {
    let upload = TempDir::new().unwrap();
    let ml = Arc::new(ml);
    let index = Arc::new(index);
    let service = ImageSearchService::new(
        settings,
        upload.path().join("upload"),
        ml.clone(),
        index.clone(),
        lookup,
    );
    Harness {
        upload,
        ml,
        index,
        service,
    }
}

impl Harness {
    fn scratch_files(&self) -> usize {
        std::fs::read_dir(self.upload.path().join("upload")).map_or(0, Iterator::count)
    }
}

// ============================================================================
// Face mode
// ============================================================================

#[test]
fn test_detection_relaxes_until_a_face_is_found() {
    let ml = FakeMl::detecting(|min_score| {
        Ok(if min_score <= 0.35 {
            vec![detection(vec![0.0, 1.0])]
        } else {
            Vec::new()
        })
    });
    let index = FakeIndex::faces(|_| Ok(vec![hit("f1", 0.2)]));
    let h = harness(ImageSearchSettings::default(), ml, index);

    let response = h.service.search(&request("face")).unwrap();

    assert_eq!(*h.ml.thresholds.lock().unwrap(), vec![0.7, 0.5, 0.35]);
    assert_eq!(response.diagnostics.used_min_score, Some(0.35));
    assert_eq!(response.diagnostics.faces_detected, 1);
    assert_eq!(response.results.len(), 1);
}

#[test]
fn test_no_face_at_any_threshold_is_an_empty_result() {
    let ml = FakeMl::detecting(|_| Ok(Vec::new()));
    let h = harness(ImageSearchSettings::default(), ml, FakeIndex::faces(|_| Ok(Vec::new())));

    let response = h.service.search(&request("face")).unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.diagnostics.faces_detected, 0);
    assert_eq!(h.ml.thresholds.lock().unwrap().len(), 3);
    assert!(h.index.queries.lock().unwrap().is_empty());
}

#[test]
fn test_distance_ladder_keeps_only_the_relaxed_results() {
    let ml = FakeMl::detecting(|_| Ok(vec![detection(vec![0.0, 1.0])]));
    let index = FakeIndex::faces(|query| {
        Ok(if query.max_distance > 0.5 {
            vec![hit("f2", 0.45), hit("f1", 0.5), hit("f3", 0.55)]
        } else {
            Vec::new()
        })
    });
    let settings = ImageSearchSettings {
        max_distance: 0.4,
        ..ImageSearchSettings::default()
    };
    let h = harness(settings, ml, index);

    let response = h.service.search(&request("face")).unwrap();

    assert_eq!(h.index.distances(), vec![0.4, 0.6]);
    assert_eq!(response.diagnostics.used_max_distances, vec![0.6]);
    assert_eq!(response.diagnostics.index_queries, 2);
    assert_eq!(response.results.len(), 1);

    let entry = &response.results[0];
    assert_eq!(entry.display_label.as_deref(), Some("Ada"));
    assert!((entry.scores.overall.unwrap() - 0.55).abs() < 1e-6);
    let members: Vec<_> = entry.members.iter().map(|m| m.asset_id.as_str()).collect();
    assert_eq!(members, vec!["a2", "a1", "a3"]);

    for query in h.index.queries.lock().unwrap().iter() {
        assert_eq!(query.max_results, 5);
        assert_eq!(query.owner_scope, OwnerScope::single("u1"));
    }
}

#[test]
fn test_each_face_is_matched_independently() {
    let ml = FakeMl::detecting(|_| {
        Ok(vec![detection(vec![1.0, 0.0]), detection(vec![0.0, 1.0])])
    });
    let index = FakeIndex::faces(|query| {
        Ok(if query.embedding.as_slice() == [0.0, 1.0] {
            vec![hit("f1", 0.3)]
        } else {
            Vec::new()
        })
    });
    let h = harness(ImageSearchSettings::default(), ml, index);

    let response = h.service.search(&request("face")).unwrap();

    assert_eq!(response.diagnostics.faces_detected, 2);
    assert_eq!(response.diagnostics.used_max_distances, vec![0.6, 0.5]);
    assert_eq!(response.diagnostics.index_queries, 3);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].members[0].display_name.as_deref(), Some("one.jpg"));
}

#[test]
fn test_detector_failure_is_not_retried() {
    let ml = FakeMl::detecting(|_| Err(Error::operation("detect_faces", "connection refused")));
    let h = harness(ImageSearchSettings::default(), ml, FakeIndex::faces(|_| Ok(Vec::new())));

    let result = h.service.search(&request("face"));

    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert_eq!(h.ml.thresholds.lock().unwrap().len(), 1);
    assert_eq!(h.scratch_files(), 0);
}

#[test]
fn test_index_failure_is_not_masked() {
    let ml = FakeMl::detecting(|_| Ok(vec![detection(vec![0.0, 1.0])]));
    let index = FakeIndex::faces(|_| Err(Error::operation("search_faces", "index offline")));
    let h = harness(ImageSearchSettings::default(), ml, index);

    let result = h.service.search(&request("face"));

    assert!(matches!(result, Err(Error::OperationFailed { .. })));
    assert_eq!(h.index.queries.lock().unwrap().len(), 1);
}

#[test]
fn test_face_dimension_mismatch_fails_before_querying() {
    let ml = FakeMl::detecting(|_| Ok(vec![detection(vec![0.0, 1.0, 0.0])]));
    let h = harness(ImageSearchSettings::default(), ml, FakeIndex::faces(|_| Ok(Vec::new())));

    let result = h.service.search(&request("face"));

    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
    assert!(h.index.queries.lock().unwrap().is_empty());
}

// ============================================================================
// Content mode
// ============================================================================

#[test]
fn test_content_search_joins_ranked_items() {
    let index = FakeIndex::ranked(vec![
        RankedItem {
            asset_id: AssetId::new("a3"),
            distance: Some(0.1),
            display_name: None,
        },
        RankedItem {
            asset_id: AssetId::new("gone"),
            distance: Some(0.2),
            display_name: Some("gone.jpg".to_string()),
        },
        RankedItem {
            asset_id: AssetId::new("a1"),
            distance: Some(0.3),
            display_name: Some("renamed.jpg".to_string()),
        },
    ]);
    let h = harness(
        ImageSearchSettings::default(),
        FakeMl::encoding(Ok(Embedding::new(vec![1.0, 0.0]))),
        index,
    );

    let response = h.service.search(&request("similar")).unwrap();

    assert!(h.ml.thresholds.lock().unwrap().is_empty());
    assert_eq!(*h.index.ranked_calls.lock().unwrap(), vec![Page::first(5)]);
    assert_eq!(response.diagnostics.index_queries, 1);
    assert_eq!(response.results.len(), 1);

    let entry = &response.results[0];
    assert_eq!(entry.display_label, None);
    assert_eq!(entry.scores.overall, None);
    let members: Vec<_> = entry
        .members
        .iter()
        .map(|m| (m.asset_id.as_str(), m.display_name.as_deref()))
        .collect();
    assert_eq!(
        members,
        vec![("a3", Some("three.jpg")), ("a1", Some("renamed.jpg"))]
    );
}

#[test]
fn test_content_search_with_no_hits_is_empty() {
    let h = harness(
        ImageSearchSettings::default(),
        FakeMl::encoding(Ok(Embedding::new(vec![1.0, 0.0]))),
        FakeIndex::ranked(Vec::new()),
    );

    let response = h.service.search(&request("content")).unwrap();

    assert!(response.results.is_empty());
}

#[test]
fn test_content_dimension_mismatch() {
    let h = harness(
        ImageSearchSettings::default(),
        FakeMl::encoding(Ok(Embedding::new(vec![1.0, 0.0, 0.0, 0.0]))),
        FakeIndex::ranked(Vec::new()),
    );

    let result = h.service.search(&request("content"));

    assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    assert!(h.index.ranked_calls.lock().unwrap().is_empty());
}

#[test]
fn test_disabled_content_search_makes_no_calls() {
    let mut settings = ImageSearchSettings::default();
    settings.encoding.enabled = false;
    let h = harness(settings, FakeMl::encoding(Ok(Embedding::new(vec![1.0]))), FakeIndex::ranked(Vec::new()));

    let result = h.service.search(&request("content"));

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(h.ml.call_count(), 0);
    assert_eq!(h.scratch_files(), 0);
}

// ============================================================================
// Lookup failures
// ============================================================================

#[test]
fn test_face_lookup_failure_fails_the_request() {
    let ml = FakeMl::detecting(|_| Ok(vec![detection(vec![0.0, 1.0])]));
    let index = FakeIndex::faces(|_| Ok(vec![hit("f2", 0.1), hit("f3", 0.2)]));
    let lookup = Arc::new(FailingLookup::default());
    let h = harness_with_lookup(ImageSearchSettings::default(), ml, index, lookup.clone());

    let result = h.service.search(&request("face"));

    assert!(matches!(
        result,
        Err(Error::OperationFailed { ref operation, .. }) if operation == "resolve_faces"
    ));
    assert_eq!(*lookup.calls.lock().unwrap(), 1);
    assert_eq!(h.index.queries.lock().unwrap().len(), 1);
    assert_eq!(h.scratch_files(), 0);
}

#[test]
fn test_content_lookup_failure_fails_the_request() {
    let index = FakeIndex::ranked(vec![RankedItem {
        asset_id: AssetId::new("a1"),
        distance: Some(0.1),
        display_name: Some("one.jpg".to_string()),
    }]);
    let lookup = Arc::new(FailingLookup::default());
    let h = harness_with_lookup(
        ImageSearchSettings::default(),
        FakeMl::encoding(Ok(Embedding::new(vec![1.0, 0.0]))),
        index,
        lookup.clone(),
    );

    let result = h.service.search(&request("content"));

    assert!(matches!(
        result,
        Err(Error::OperationFailed { ref operation, .. }) if operation == "resolve_assets"
    ));
    assert_eq!(*lookup.calls.lock().unwrap(), 1);
    assert_eq!(h.scratch_files(), 0);
}

// ============================================================================
// Request validation and scratch files
// ============================================================================

#[test]
fn test_invalid_mode_is_rejected_up_front() {
    let result = ImageSearchRequest::new(
        "hybrid",
        vec![1, 2, 3],
        "query.jpg",
        OwnerScope::single("u1"),
        None,
    );
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_empty_image_is_rejected_up_front() {
    let result = ImageSearchRequest::new("face", Vec::new(), "query.jpg", OwnerScope::new(), None);
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_scratch_image_exists_only_during_the_request() {
    let ml = FakeMl::detecting(|_| Ok(vec![detection(vec![0.0, 1.0])]));
    let h = harness(ImageSearchSettings::default(), ml, FakeIndex::faces(|_| Ok(vec![hit("f1", 0.1)])));

    h.service.search(&request("face")).unwrap();

    let seen = h.ml.seen_paths.lock().unwrap();
    assert!(!seen.is_empty());
    for (path, existed) in seen.iter() {
        assert!(existed, "scratch image missing during call");
        assert!(!path.exists(), "scratch image left behind");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
    assert_eq!(h.scratch_files(), 0);
}

#[test]
fn test_scratch_image_removed_after_failure() {
    let h = harness(
        ImageSearchSettings::default(),
        FakeMl::encoding(Err(Error::operation("encode_image", "model crashed"))),
        FakeIndex::ranked(Vec::new()),
    );

    assert!(h.service.search(&request("content")).is_err());

    let seen = h.ml.seen_paths.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1);
    assert!(!seen[0].0.exists());
    assert_eq!(h.scratch_files(), 0);
}
