//! Person ratings.

use super::{OwnerId, PersonId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores a user assigned to a person. Missing scores count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRating {
    /// Looks score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looks: Option<f32>,
    /// Body score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<f32>,
    /// Content score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<f32>,
    /// Overall score; zero or missing means unrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f32>,
}

impl PersonRating {
    /// Returns the score for a dimension, defaulting to zero.
    #[must_use]
    pub fn score(&self, dimension: RatingDimension) -> f32 {
        match dimension {
            RatingDimension::Overall => self.overall,
            RatingDimension::Looks => self.looks,
            RatingDimension::Body => self.body,
            RatingDimension::Content => self.content,
        }
        .unwrap_or(0.0)
    }

    /// Returns true when no overall score has been given.
    #[must_use]
    pub fn is_unrated(&self) -> bool {
        self.score(RatingDimension::Overall) == 0.0
    }
}

/// A sortable rating dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingDimension {
    /// Overall score.
    #[default]
    Overall,
    /// Looks score.
    Looks,
    /// Body score.
    Body,
    /// Content score.
    Content,
}

impl RatingDimension {
    /// Parses a dimension name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "overall" => Some(Self::Overall),
            "looks" => Some(Self::Looks),
            "body" => Some(Self::Body),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

/// One persisted rating line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    /// The rated person.
    pub id: PersonId,
    /// Owner who rated the person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    /// The scores.
    pub rate: PersonRating,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}
