//! Embedding vectors.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector produced by a face or image model.
///
/// The dimension is model specific. Every binary operation checks that both
/// operands share a dimension and fails with [`Error::DimensionMismatch`]
/// instead of truncating.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps raw vector components.
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Parses a vector literal such as `[0.1,0.2,0.3]` or `{0.1,0.2}`.
    ///
    /// Brackets and braces are stripped; every component must parse to a
    /// finite number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty literal or a component
    /// that is not a finite number.
    pub fn parse_literal(literal: &str) -> Result<Self> {
        let cleaned: String = literal
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '{' | '}'))
            .collect();
        if cleaned.trim().is_empty() {
            return Err(Error::InvalidInput("empty embedding literal".to_string()));
        }

        let values = cleaned
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("invalid embedding component: '{}'", part.trim()))
                    })
            })
            .collect::<Result<Vec<f32>>>()?;

        Ok(Self(values))
    }

    /// Number of components.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the raw components.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Consumes the embedding, returning the raw components.
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Returns true when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Checks that this embedding has the expected dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the lengths differ.
    pub fn ensure_dimensions(&self, expected: usize) -> Result<()> {
        if self.0.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    /// Squared Euclidean distance to another embedding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the lengths differ.
    pub fn squared_distance(&self, other: &Self) -> Result<f32> {
        other.ensure_dimensions(self.dimensions())?;
        Ok(self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum())
    }

    /// Dot product with another embedding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the lengths differ.
    pub fn dot(&self, other: &Self) -> Result<f32> {
        other.ensure_dimensions(self.dimensions())?;
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }

    /// Cosine distance (`1 - cosine similarity`), in `[0, 2]`.
    ///
    /// A zero-magnitude operand is treated as maximally distant from
    /// everything except itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the lengths differ.
    pub fn cosine_distance(&self, other: &Self) -> Result<f32> {
        let dot = self.dot(other)?;
        let norm_a = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b = other.0.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(if norm_a == norm_b { 0.0 } else { 1.0 });
        }

        Ok((1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl From<&[f32]> for Embedding {
    fn from(values: &[f32]) -> Self {
        Self(values.to_vec())
    }
}
