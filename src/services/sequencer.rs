//! Embedding-based asset sequencing.
//!
//! Produces a browsing order that keeps visually similar assets next to each
//! other. Assets with an embedding are ordered by one of two strategies;
//! assets without one follow in input order.
//!
//! | Embedded assets | Strategy | Cost |
//! |-----------------|----------|------|
//! | `<= chaining_limit` | [`NearestNeighborChain`] | O(n²) |
//! | `> chaining_limit` | [`CentroidProjection`] | O(n log n) |

use crate::models::{AssetId, Embedding, SequencableAsset};
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Largest embedded set ordered by nearest-neighbor chaining.
pub const DEFAULT_CHAINING_LIMIT: usize = 1500;

/// Orders a point cloud.
///
/// Implementations receive points that all share one dimension plus their
/// centroid, and return a permutation of `0..points.len()`.
pub trait OrderingStrategy: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns point indices in visiting order.
    ///
    /// # Errors
    ///
    /// Returns an error if two vectors disagree on dimension.
    fn order(&self, points: &[&Embedding], centroid: &Embedding) -> Result<Vec<usize>>;
}

/// Sorts points by their dot product with the centroid, largest first.
///
/// Ties keep input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidProjection;

impl OrderingStrategy for CentroidProjection {
    fn name(&self) -> &'static str {
        "centroid_projection"
    }

    fn order(&self, points: &[&Embedding], centroid: &Embedding) -> Result<Vec<usize>> {
        let mut projections = points
            .iter()
            .enumerate()
            .map(|(i, point)| Ok((i, point.dot(centroid)?)))
            .collect::<Result<Vec<_>>>()?;
        projections.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(projections.into_iter().map(|(i, _)| i).collect())
    }
}

/// Greedy open tour: seed at the point closest to the centroid, then keep
/// stepping to the closest unvisited point.
///
/// Distances are squared Euclidean. On ties the lowest index wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborChain;

impl NearestNeighborChain {
    fn closest(
        points: &[&Embedding],
        target: &Embedding,
        visited: &[bool],
    ) -> Result<Option<usize>> {
        let mut best: Option<(usize, f32)> = None;
        for (i, point) in points.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let distance = point.squared_distance(target)?;
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        Ok(best.map(|(i, _)| i))
    }
}

impl OrderingStrategy for NearestNeighborChain {
    fn name(&self) -> &'static str {
        "nearest_neighbor_chain"
    }

    fn order(&self, points: &[&Embedding], centroid: &Embedding) -> Result<Vec<usize>> {
        let mut visited = vec![false; points.len()];
        let mut order = Vec::with_capacity(points.len());

        let mut current = Self::closest(points, centroid, &visited)?;
        while let Some(index) = current {
            visited[index] = true;
            order.push(index);
            current = Self::closest(points, points[index], &visited)?;
        }

        Ok(order)
    }
}

static CENTROID_PROJECTION: CentroidProjection = CentroidProjection;
static NEAREST_NEIGHBOR_CHAIN: NearestNeighborChain = NearestNeighborChain;

/// Orders assets for browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequencer {
    chaining_limit: usize,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_CHAINING_LIMIT)
    }
}

impl Sequencer {
    /// Creates a sequencer that chains up to `chaining_limit` embedded assets.
    #[must_use]
    pub const fn new(chaining_limit: usize) -> Self {
        Self { chaining_limit }
    }

    /// The chaining limit.
    #[must_use]
    pub const fn chaining_limit(&self) -> usize {
        self.chaining_limit
    }

    /// Picks the strategy for `n` embedded assets.
    #[must_use]
    pub fn strategy_for(&self, n: usize) -> &'static dyn OrderingStrategy {
        if n > self.chaining_limit {
            &CENTROID_PROJECTION
        } else {
            &NEAREST_NEIGHBOR_CHAIN
        }
    }

    /// Returns asset ids in browsing order.
    ///
    /// Deterministic for identical input. With zero or one embedded asset the
    /// input order is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the embeddings do not all share
    /// one dimension.
    pub fn order(&self, assets: &[SequencableAsset]) -> Result<Vec<AssetId>> {
        Ok(self
            .arrange(assets)?
            .into_iter()
            .map(|asset| asset.id.clone())
            .collect())
    }

    /// Like [`order`](Self::order) but returns the assets themselves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the embeddings do not all share
    /// one dimension.
    #[instrument(skip(self, assets), fields(operation = "sequence", assets = assets.len()))]
    pub fn arrange<'a>(&self, assets: &'a [SequencableAsset]) -> Result<Vec<&'a SequencableAsset>> {
        let (with_embedding, without_embedding): (Vec<_>, Vec<_>) =
            assets.iter().partition(|a| a.embedding.is_some());

        if with_embedding.len() <= 1 {
            return Ok(assets.iter().collect());
        }

        let points: Vec<&Embedding> = with_embedding
            .iter()
            .filter_map(|a| a.embedding.as_ref())
            .collect();
        let centroid = centroid(&points)?;

        let start = Instant::now();
        let strategy = self.strategy_for(points.len());
        let indices = strategy.order(&points, &centroid)?;

        tracing::debug!(
            strategy = strategy.name(),
            embedded = points.len(),
            without_embedding = without_embedding.len(),
            duration_ms = start.elapsed().as_millis(),
            "Ordered assets"
        );
        metrics::counter!("sequencer_assets_ordered", "strategy" => strategy.name())
            .increment(points.len() as u64);

        let mut ordered: Vec<&SequencableAsset> = indices
            .into_iter()
            .map(|i| with_embedding[i])
            .collect();
        ordered.extend(without_embedding);
        Ok(ordered)
    }
}

/// Element-wise mean of `points`, which must be non-empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn centroid(points: &[&Embedding]) -> Result<Embedding> {
    let Some(first) = points.first() else {
        return Err(Error::InvalidInput(
            "centroid of an empty point set".to_string(),
        ));
    };
    let dimensions = first.dimensions();
    let mut sums = vec![0.0_f64; dimensions];
    for point in points {
        point.ensure_dimensions(dimensions)?;
        for (sum, value) in sums.iter_mut().zip(point.as_slice()) {
            *sum += f64::from(*value);
        }
    }

    let count = points.len() as f64;
    Ok(Embedding::new(
        sums.into_iter().map(|s| (s / count) as f32).collect(),
    ))
}
