//! HTTP client for the machine-learning service.
//!
//! Speaks the `/predict` protocol: a multipart form with an `entries` JSON
//! field describing the requested tasks and an `image` file field.

use super::{EmbeddingClient, FaceDetectionOptions, ImageEncodingOptions};
use crate::models::{BoundingBox, Embedding, FaceDetection, FaceDetectionResult};
use crate::{Error, Result};
use reqwest::blocking::multipart::Form;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// HTTP settings for the machine-learning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineLearningHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for MachineLearningHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            connect_timeout_ms: 3_000,
        }
    }
}

/// Blocking client for the machine-learning service.
pub struct MachineLearningClient {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl MachineLearningClient {
    /// Default service endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:3003";

    /// Creates a client for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, config: MachineLearningHttpConfig) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: build_http_client(config),
        }
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns true if the service answers its health check.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/ping", self.endpoint))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn predict<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        image_path: &Path,
        entries: &serde_json::Value,
    ) -> Result<T> {
        let form = Form::new()
            .text("entries", entries.to_string())
            .file("image", image_path)
            .map_err(|e| Error::operation(operation, format!("cannot attach image: {e}")))?;

        let response = self
            .client
            .post(format!("{}/predict", self.endpoint))
            .multipart(form)
            .send()
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else if e.is_request() {
                    "request"
                } else {
                    "unknown"
                };
                tracing::error!(
                    endpoint = %self.endpoint,
                    operation,
                    error = %e,
                    error_kind,
                    "Machine-learning request failed"
                );
                Error::operation(operation, format!("{error_kind} error: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                endpoint = %self.endpoint,
                operation,
                status = %status,
                body = %body,
                "Machine-learning service returned error status"
            );
            return Err(Error::operation(
                operation,
                format!("service returned status: {status} - {body}"),
            ));
        }

        response.json::<T>().map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse machine-learning response");
            Error::operation(operation, e)
        })
    }
}

impl EmbeddingClient for MachineLearningClient {
    fn detect_faces(
        &self,
        image_path: &Path,
        options: &FaceDetectionOptions,
    ) -> Result<FaceDetectionResult> {
        let entries = json!({
            "facial-recognition": {
                "detection": {
                    "modelName": options.model_name,
                    "options": { "minScore": options.min_score },
                },
                "recognition": { "modelName": options.model_name },
            }
        });

        let response: FacialRecognitionResponse =
            self.predict("detect_faces", image_path, &entries)?;

        let faces = response
            .faces
            .into_iter()
            .map(|face| {
                Ok(FaceDetection {
                    bounding_box: face.bounding_box,
                    confidence: face.score,
                    embedding: face.embedding.into_embedding()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FaceDetectionResult {
            faces,
            image_width: response.image_width,
            image_height: response.image_height,
        })
    }

    fn encode_image(&self, image_path: &Path, options: &ImageEncodingOptions) -> Result<Embedding> {
        if !options.enabled {
            return Err(Error::InvalidInput(
                "image encoding is disabled".to_string(),
            ));
        }

        let entries = json!({
            "clip": { "visual": { "modelName": options.model_name } }
        });

        let response: ClipResponse = self.predict("encode_image", image_path, &entries)?;
        response.clip.into_embedding()
    }
}

/// Builds a blocking HTTP client with configured timeouts.
fn build_http_client(config: MachineLearningHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build machine-learning HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

/// Embeddings arrive either as a vector literal string or as a JSON array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEmbedding {
    Literal(String),
    Values(Vec<f32>),
}

impl WireEmbedding {
    fn into_embedding(self) -> Result<Embedding> {
        match self {
            Self::Literal(literal) => Embedding::parse_literal(&literal),
            Self::Values(values) => Ok(Embedding::new(values)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFace {
    bounding_box: BoundingBox,
    embedding: WireEmbedding,
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FacialRecognitionResponse {
    #[serde(rename = "facial-recognition", default)]
    faces: Vec<WireFace>,
    #[serde(default)]
    image_width: u32,
    #[serde(default)]
    image_height: u32,
}

#[derive(Debug, Deserialize)]
struct ClipResponse {
    clip: WireEmbedding,
}
