//! Embedding producers.
//!
//! Face detection and whole-image encoding run in an external machine-learning
//! service. The core only sees the [`EmbeddingClient`] trait; the HTTP adapter
//! lives in [`MachineLearningClient`].

mod http;

pub use http::{MachineLearningClient, MachineLearningHttpConfig};

use crate::Result;
use crate::models::{Embedding, FaceDetectionResult};
use std::path::Path;

/// Options for a face detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetectionOptions {
    /// Face detection/recognition model name.
    pub model_name: String,
    /// Minimum detector confidence for a face to be reported.
    pub min_score: f32,
}

/// Options for a whole-image encoding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEncodingOptions {
    /// Image encoder model name.
    pub model_name: String,
    /// Whether image encoding is enabled at all.
    pub enabled: bool,
}

/// Trait for embedding producers.
///
/// Implementations read the image from `image_path`, which stays valid for the
/// duration of the call only. Timeouts and retries are the implementation's
/// business; an `Err` is treated as fatal by the caller.
pub trait EmbeddingClient: Send + Sync {
    /// Detects faces and returns one embedding per face, in detector order.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector cannot be reached or rejects the image.
    fn detect_faces(
        &self,
        image_path: &Path,
        options: &FaceDetectionOptions,
    ) -> Result<FaceDetectionResult>;

    /// Encodes the whole image into a single embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be reached or rejects the image.
    fn encode_image(&self, image_path: &Path, options: &ImageEncodingOptions) -> Result<Embedding>;
}
