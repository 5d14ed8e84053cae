//! Distance-to-exemplar ranking.

use std::collections::BTreeMap;

use crate::error::{RankError, RankResult};
use crate::metric::Projection;
use crate::ranking::average_rank_percentiles;
use crate::vector::{DocIndex, DocumentMatrix, cosine_distance, mean_of_rows};

/// Non-empty list of exemplar documents for one tag.
///
/// Duplicates are kept: the exemplar mean weights each entry by how often
/// it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositiveSet(Vec<DocIndex>);

impl PositiveSet {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> RankResult<Self> {
        let indices: Vec<DocIndex> = indices.into_iter().map(DocIndex::new).collect();
        if indices.is_empty() {
            return Err(RankError::invalid("positive document set is empty"));
        }
        Ok(Self(indices))
    }

    #[must_use]
    pub fn indices(&self) -> &[DocIndex] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-document distances and percentiles for one tag, index-addressable.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult {
    distances: Vec<f64>,
    percentiles: Vec<f64>,
}

impl RankingResult {
    /// Ranks precomputed distances.
    pub fn from_distances(distances: Vec<f64>) -> Self {
        let percentiles = average_rank_percentiles(&distances);
        Self {
            distances,
            percentiles,
        }
    }

    /// Distance to the exemplar mean, by document index.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Percentile rank, by document index.
    #[must_use]
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    #[must_use]
    pub fn percentile(&self, index: DocIndex) -> Option<f64> {
        self.percentiles.get(index.get()).copied()
    }

    /// `(index, percentile)` pairs in document order.
    #[must_use]
    pub fn percentile_pairs(&self) -> Vec<(usize, f64)> {
        self.percentiles.iter().copied().enumerate().collect()
    }

    /// Lookup of percentile by document index.
    #[must_use]
    pub fn percentile_map(&self) -> BTreeMap<usize, f64> {
        self.percentiles.iter().copied().enumerate().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Ranks every document by cosine distance to the projected exemplar mean.
pub fn rank(
    docs: &DocumentMatrix,
    projection: &Projection,
    positives: &PositiveSet,
) -> RankResult<RankingResult> {
    let mut rows = Vec::with_capacity(positives.len());
    for index in positives.indices() {
        docs.check_index(*index)
            .map_err(|e| RankError::invalid(format!("positive document: {e}")))?;
        rows.push(index.get());
    }

    let projected = projection.apply(docs);
    let mean = mean_of_rows(projected.view(), &rows)
        .ok_or_else(|| RankError::invalid("positive document set is empty"))?;

    let distances: Vec<f64> = projected
        .rows()
        .into_iter()
        .map(|row| cosine_distance(row, mean.view()))
        .collect();

    Ok(RankingResult::from_distances(distances))
}
