//! Cholesky factorization of the learned metric for bulk projection.
//!
//! With `A = L·Lᵀ`, the Mahalanobis geometry of row vectors `x` under `A`
//! is the Euclidean geometry of `x·L`, so ranking can project the whole
//! matrix once and then work with plain cosine distances.

use ndarray::{Array2, ArrayView2, CowArray, Ix2, s};

use crate::error::{RankError, RankResult};
use crate::metric::{MetricFold, MetricMatrix};
use crate::vector::DocumentMatrix;

/// Lower-triangular factor `L` with `L·Lᵀ = A`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFactor {
    lower: Array2<f64>,
}

impl MetricFactor {
    #[must_use]
    pub fn lower(&self) -> ArrayView2<'_, f64> {
        self.lower.view()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.nrows()
    }

    /// `L·Lᵀ`, the metric this factor was computed from.
    #[must_use]
    pub fn reconstruct(&self) -> Array2<f64> {
        self.lower.dot(&self.lower.t())
    }
}

/// Factorizes a symmetric positive definite metric.
///
/// Sweeps columns left to right; the inner products run over contiguous
/// partial rows of `L`. A non-positive or non-finite pivot means the metric
/// lost definiteness during the fold.
pub fn factorize(metric: &MetricMatrix) -> RankResult<MetricFactor> {
    let a = metric.view();
    let n = metric.dimension();
    let mut lower = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        // Diagonal: A[j,j] - sum_k L[j,k]^2 for k in 0..j
        let head = lower.slice(s![j, ..j]);
        let pivot = a[[j, j]] - head.dot(&head);

        if !(pivot.is_finite() && pivot > 0.0) {
            return Err(RankError::NumericalInstability { column: j, pivot });
        }
        let diagonal = pivot.sqrt();
        lower[[j, j]] = diagonal;

        // Below the diagonal: (A[i,j] - sum_k L[i,k]*L[j,k]) / L[j,j]
        for i in (j + 1)..n {
            let partial = lower.slice(s![i, ..j]).dot(&lower.slice(s![j, ..j]));
            lower[[i, j]] = (a[[i, j]] - partial) / diagonal;
        }
    }

    Ok(MetricFactor { lower })
}

/// How document vectors are mapped before distances are measured.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Identity metric: vectors are used as stored.
    Identity,
    /// Learned metric: vectors are multiplied by the factor.
    Factor(MetricFactor),
}

impl Projection {
    /// Builds the projection for a fold, skipping factorization for the identity.
    pub fn from_fold(fold: MetricFold) -> RankResult<Self> {
        match fold {
            MetricFold::Identity { .. } => Ok(Self::Identity),
            MetricFold::Learned(metric) => factorize(&metric).map(Self::Factor),
        }
    }

    /// Projects every row; the identity path borrows the stored matrix.
    pub fn apply<'a>(&self, docs: &'a DocumentMatrix) -> CowArray<'a, f64, Ix2> {
        match self {
            Self::Identity => CowArray::from(docs.view()),
            Self::Factor(factor) => CowArray::from(docs.view().dot(&factor.lower)),
        }
    }
}
