//! Face detection types.

use super::Embedding;
use serde::{Deserialize, Serialize};

/// Pixel-space bounding box of a detected face, `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

/// A single face found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    /// Where the face is in the source image.
    pub bounding_box: BoundingBox,
    /// Detector confidence in `[0, 1]`.
    #[serde(alias = "score")]
    pub confidence: f32,
    /// Face recognition embedding.
    pub embedding: Embedding,
}

/// All faces found in one image, in detector order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetectionResult {
    /// Detected faces; may be empty.
    pub faces: Vec<FaceDetection>,
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
}

impl FaceDetectionResult {
    /// Returns true if no face was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
