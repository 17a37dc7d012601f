//! Image search orchestration.
//!
//! Face mode runs two fallback ladders per request: one over detection
//! confidence (once) and one over match distance (once per detected face).
//! Content mode encodes the whole image and issues a single ranked query.

use super::assembler::ResultAssembler;
use super::ladder::{Ladder, LadderOutcome, first_non_empty};
use crate::embedding::{EmbeddingClient, FaceDetectionOptions, ImageEncodingOptions};
use crate::models::{
    FaceDetection, ImageSearchRequest, ImageSearchResponse, Page, SearchDiagnostics, SearchHit,
    SearchMode, SearchQuery,
};
use crate::storage::ScratchImage;
use crate::storage::traits::{EntityLookup, VectorIndex};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Thresholds and model options for image search.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSearchSettings {
    /// Face model and first detection threshold.
    pub face: FaceDetectionOptions,
    /// Whole-image encoder options.
    pub encoding: ImageEncodingOptions,
    /// Detection thresholds tried after `face.min_score`.
    pub detection_fallbacks: Vec<f32>,
    /// First match distance ceiling.
    pub max_distance: f32,
    /// Ceiling tried after `max_distance` when larger.
    pub distance_floor: f32,
}

impl Default for ImageSearchSettings {
    fn default() -> Self {
        crate::LenscapeConfig::default().image_search_settings()
    }
}

impl ImageSearchSettings {
    /// Detection thresholds, strictest first.
    #[must_use]
    pub fn detection_ladder(&self) -> Ladder {
        Ladder::relaxing_scores(self.face.min_score, &self.detection_fallbacks)
    }

    /// Match distance ceilings, strictest first.
    #[must_use]
    pub fn distance_ladder(&self) -> Ladder {
        Ladder::relaxing_distances(self.max_distance, &[self.distance_floor])
    }
}

/// Searches the catalog by example image.
///
/// Holds no per-request state; one instance can serve concurrent callers.
pub struct ImageSearchService {
    settings: ImageSearchSettings,
    upload_dir: PathBuf,
    embeddings: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    lookup: Arc<dyn EntityLookup>,
}

impl ImageSearchService {
    /// Creates a search service.
    ///
    /// Uploaded images are written under `upload_dir` for the duration of a
    /// request.
    #[must_use]
    pub fn new(
        settings: ImageSearchSettings,
        upload_dir: impl Into<PathBuf>,
        embeddings: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        lookup: Arc<dyn EntityLookup>,
    ) -> Self {
        Self {
            settings,
            upload_dir: upload_dir.into(),
            embeddings,
            index,
            lookup,
        }
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &ImageSearchSettings {
        &self.settings
    }

    /// Runs one image search.
    ///
    /// An empty result list is not an error. The uploaded image is written
    /// to a scratch file that is removed before this returns, whatever the
    /// outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if content search is disabled
    /// - [`Error::DimensionMismatch`] if a query vector does not fit the index
    /// - [`Error::OperationFailed`] if any collaborator fails
    #[allow(clippy::cast_precision_loss)]
    #[instrument(
        skip(self, request),
        fields(
            operation = "image_search",
            mode = %request.mode,
            owner_count = request.owner_scope.len(),
            max_results = request.max_results,
            image_bytes = request.image.bytes.len()
        )
    )]
    pub fn search(&self, request: &ImageSearchRequest) -> Result<ImageSearchResponse> {
        if request.mode == SearchMode::Content && !self.settings.encoding.enabled {
            return Err(Error::InvalidInput(
                "content search is disabled".to_string(),
            ));
        }

        let start = Instant::now();
        metrics::counter!("image_search_requests_total", "mode" => request.mode.as_str())
            .increment(1);

        let scratch = ScratchImage::write(&self.upload_dir, &request.image)?;
        let result = match request.mode {
            SearchMode::Face => self.search_faces(scratch.path(), request),
            SearchMode::Content => self.search_content(scratch.path(), request),
        };
        drop(scratch);

        let duration_ms = start.elapsed().as_millis();
        metrics::histogram!("image_search_duration_ms", "mode" => request.mode.as_str())
            .record(duration_ms as f64);

        match &result {
            Ok(response) => tracing::info!(
                results = response.results.len(),
                faces_detected = response.diagnostics.faces_detected,
                used_min_score = ?response.diagnostics.used_min_score,
                index_queries = response.diagnostics.index_queries,
                duration_ms,
                "Image search completed"
            ),
            Err(e) => tracing::warn!(error = %e, duration_ms, "Image search failed"),
        }
        result
    }

    fn search_faces(
        &self,
        image_path: &Path,
        request: &ImageSearchRequest,
    ) -> Result<ImageSearchResponse> {
        let detection_ladder = self.settings.detection_ladder();
        let detection = first_non_empty(&detection_ladder, |min_score| {
            let options = FaceDetectionOptions {
                model_name: self.settings.face.model_name.clone(),
                min_score,
            };
            Ok(self.embeddings.detect_faces(image_path, &options)?.faces)
        })?;
        record_ladder("detection", detection.attempts);

        tracing::debug!(
            faces = detection.items.len(),
            used_min_score = detection.step,
            attempts = detection.attempts,
            "Face detection finished"
        );

        if let Some(dimensions) = self.index.face_dimensions() {
            for face in &detection.items {
                face.embedding.ensure_dimensions(dimensions)?;
            }
        }

        let mut diagnostics = SearchDiagnostics {
            used_min_score: Some(detection.step),
            faces_detected: detection.items.len(),
            ..SearchDiagnostics::default()
        };

        let distance_ladder = self.settings.distance_ladder();
        let mut assembler = ResultAssembler::new(self.lookup.as_ref());
        let mut results = Vec::new();

        for (position, face) in detection.items.iter().enumerate() {
            let hits = self.match_face(face, request, &distance_ladder)?;
            diagnostics.used_max_distances.push(hits.step);
            diagnostics.index_queries += hits.attempts;

            tracing::debug!(
                face = position,
                hits = hits.items.len(),
                used_max_distance = hits.step,
                "Face matched"
            );

            if let Some(entry) = assembler.face_entry(&hits.items)? {
                results.push(entry);
            }
        }

        Ok(ImageSearchResponse {
            results,
            diagnostics,
        })
    }

    fn match_face(
        &self,
        face: &FaceDetection,
        request: &ImageSearchRequest,
        ladder: &Ladder,
    ) -> Result<LadderOutcome<SearchHit>> {
        let mut query = SearchQuery::new(
            request.owner_scope.clone(),
            face.embedding.clone(),
            request.max_results,
            self.settings.max_distance,
        )?;
        let outcome = first_non_empty(ladder, |max_distance| {
            query.max_distance = max_distance;
            self.index.search_faces(&query)
        })?;
        record_ladder("distance", outcome.attempts);
        Ok(outcome)
    }

    fn search_content(
        &self,
        image_path: &Path,
        request: &ImageSearchRequest,
    ) -> Result<ImageSearchResponse> {
        let embedding = self
            .embeddings
            .encode_image(image_path, &self.settings.encoding)?;
        if let Some(dimensions) = self.index.image_dimensions() {
            embedding.ensure_dimensions(dimensions)?;
        }

        let page = self.index.search_images_ranked(
            Page::first(request.max_results),
            &request.owner_scope,
            &embedding,
        )?;
        tracing::debug!(items = page.items.len(), "Ranked image search finished");

        let mut assembler = ResultAssembler::new(self.lookup.as_ref());
        let results = assembler.content_entry(&page.items)?.into_iter().collect();

        Ok(ImageSearchResponse {
            results,
            diagnostics: SearchDiagnostics {
                index_queries: 1,
                ..SearchDiagnostics::default()
            },
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_ladder(ladder: &'static str, attempts: usize) {
    metrics::histogram!("search_ladder_attempts", "ladder" => ladder).record(attempts as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladders() {
        let settings = ImageSearchSettings::default();
        assert_eq!(settings.detection_ladder().steps(), &[0.7, 0.5, 0.35]);
        assert_eq!(settings.distance_ladder().steps(), &[0.5, 0.6]);
    }

    #[test]
    fn test_loose_distance_is_not_tightened() {
        let settings = ImageSearchSettings {
            max_distance: 0.8,
            ..ImageSearchSettings::default()
        };
        assert_eq!(settings.distance_ladder().steps(), &[0.8]);
    }
}
