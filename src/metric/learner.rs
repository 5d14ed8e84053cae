//! Online Mahalanobis metric learning (LEGO update).
//!
//! Each pairwise constraint nudges the metric `A` so that the squared
//! distance `zᵀ·A·z` of the pair moves toward a target distance, while
//! staying close to the previous metric in the log-determinant divergence.
//! The update is a closed-form rank-one correction, so a fold over `k`
//! constraints costs `O(k·D²)`.
//!
//! # Algorithm
//! For a constraint `(u, v, label)` with `z = u − v`:
//! 1. `ŷ = zᵀ·A·z` (current squared distance)
//! 2. `ȳ` = positive root of `r·ŷ·ȳ² − (r·y·ŷ − 1)·ȳ − ŷ = 0`
//! 3. `A ← A − r·(ȳ − y)·(A·z)(A·z)ᵀ / (1 + r·(ȳ − y)·ŷ)`
//!
//! After the update the pair's squared distance equals `ȳ`, which always
//! lies between `ŷ` and the target `y`.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{RankError, RankResult};
use crate::vector::{DocIndex, DocumentMatrix};

/// Squared distances and denominators at or below this are treated as zero.
const EPSILON: f64 = 1e-12;

/// Pairwise judgment attached to a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Both documents belong to the same group
    Similar,
    /// The documents belong to different groups
    Dissimilar,
}

/// An ordered pairwise constraint between two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub u: DocIndex,
    pub v: DocIndex,
    pub label: Label,
}

impl Constraint {
    pub fn new(u: usize, v: usize, label: Label) -> Self {
        Self {
            u: DocIndex::new(u),
            v: DocIndex::new(v),
            label,
        }
    }

    pub fn similar(u: usize, v: usize) -> Self {
        Self::new(u, v, Label::Similar)
    }

    pub fn dissimilar(u: usize, v: usize) -> Self {
        Self::new(u, v, Label::Dissimilar)
    }
}

/// Hyperparameters of the online update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerParams {
    /// Step size `r`
    pub regularization: f64,
    /// Target squared distance for [`Label::Similar`]
    pub target_same: f64,
    /// Target squared distance for [`Label::Dissimilar`]
    pub target_different: f64,
}

impl Default for LearnerParams {
    fn default() -> Self {
        Self {
            regularization: 0.5,
            target_same: 7.0,
            target_different: 10.0,
        }
    }
}

impl LearnerParams {
    /// Rejects parameters for which the update is not guaranteed to keep `A` PSD.
    pub fn validate(&self) -> RankResult<()> {
        if !(self.regularization.is_finite() && self.regularization > 0.0) {
            return Err(RankError::invalid(format!(
                "regularization must be a positive finite number, got {}",
                self.regularization
            )));
        }
        for (name, value) in [
            ("target_same", self.target_same),
            ("target_different", self.target_different),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RankError::invalid(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Target squared distance for a label.
    #[must_use]
    pub fn target(&self, label: Label) -> f64 {
        match label {
            Label::Similar => self.target_same,
            Label::Dissimilar => self.target_different,
        }
    }
}

/// Learned D×D Mahalanobis metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatrix(Array2<f64>);

impl MetricMatrix {
    /// The D-dimensional identity metric.
    #[must_use]
    pub fn identity(dimension: usize) -> Self {
        Self(Array2::eye(dimension))
    }

    /// Wraps an existing square matrix.
    pub fn from_array(matrix: Array2<f64>) -> RankResult<Self> {
        if !matrix.is_square() {
            return Err(RankError::invalid(format!(
                "metric matrix must be square, got {:?}",
                matrix.dim()
            )));
        }
        Ok(Self(matrix))
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.nrows()
    }

    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.0
    }

    /// Squared Mahalanobis distance `zᵀ·A·z`.
    #[must_use]
    pub fn squared_norm(&self, z: ArrayView1<'_, f64>) -> f64 {
        z.dot(&self.0.dot(&z))
    }

    /// Largest absolute difference between `A` and `Aᵀ`.
    #[must_use]
    pub fn asymmetry(&self) -> f64 {
        self.0
            .iter()
            .zip(self.0.t().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// Outcome of folding a constraint list.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricFold {
    /// No constraints were supplied; the metric is the untouched identity.
    Identity { dimension: usize },
    /// At least one constraint was folded.
    Learned(MetricMatrix),
}

impl MetricFold {
    /// The metric as a matrix, materializing the identity if needed.
    #[must_use]
    pub fn into_matrix(self) -> MetricMatrix {
        match self {
            Self::Identity { dimension } => MetricMatrix::identity(dimension),
            Self::Learned(metric) => metric,
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity { .. })
    }
}

/// What a single update did to the metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// Rank-one correction applied; `y_bar` is the pair's new squared distance.
    Applied { y_current: f64, y_bar: f64 },
    /// The pair already sits at the target or coincides in the metric.
    Unchanged { y_current: f64 },
    /// The correction's denominator vanished; the metric was left as is.
    Skipped { y_current: f64, denominator: f64 },
}

/// Folds ordered constraint lists into a metric.
#[derive(Debug, Clone, Copy)]
pub struct OnlineMetricLearner {
    params: LearnerParams,
}

impl Default for OnlineMetricLearner {
    fn default() -> Self {
        Self {
            params: LearnerParams::default(),
        }
    }
}

impl OnlineMetricLearner {
    /// Creates a learner after validating its hyperparameters.
    pub fn new(params: LearnerParams) -> RankResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    #[must_use]
    pub fn params(&self) -> &LearnerParams {
        &self.params
    }

    /// Folds `constraints` in order, starting from the identity metric.
    ///
    /// Every constraint index is checked before any update runs, so a bad
    /// index fails the whole fold without partial work.
    pub fn fold(
        &self,
        docs: &DocumentMatrix,
        constraints: &[Constraint],
    ) -> RankResult<MetricFold> {
        for (position, constraint) in constraints.iter().enumerate() {
            for index in [constraint.u, constraint.v] {
                docs.check_index(index).map_err(|e| {
                    RankError::invalid(format!("constraint #{position}: {e}"))
                })?;
            }
        }

        if constraints.is_empty() {
            return Ok(MetricFold::Identity {
                dimension: docs.dimension(),
            });
        }

        let rows = docs.view();
        let mut metric = Array2::eye(docs.dimension());

        for (position, constraint) in constraints.iter().enumerate() {
            let z: Array1<f64> = &rows.row(constraint.u.get()) - &rows.row(constraint.v.get());
            let y = self.params.target(constraint.label);

            match lego_update(&mut metric, z.view(), y, self.params.regularization) {
                UpdateOutcome::Skipped {
                    y_current,
                    denominator,
                } => tracing::warn!(
                    "skipped constraint #{position} ({} ~ {}): degenerate update denominator {denominator:e} at distance {y_current:e}",
                    constraint.u,
                    constraint.v
                ),
                outcome => tracing::trace!("constraint #{position}: {outcome:?}"),
            }
        }

        Ok(MetricFold::Learned(MetricMatrix(metric)))
    }
}

/// Closed-form target `ȳ` for the update, with the degenerate-input guards.
///
/// Uses whichever of the two algebraically equal forms of the positive root
/// avoids cancellation for the sign of `r·y·ŷ − 1`.
pub fn solve_y_bar(y_current: f64, y: f64, r: f64) -> f64 {
    if y_current.abs() <= EPSILON {
        return y;
    }

    let b = r * y * y_current - 1.0;
    let root = (b * b + 4.0 * r * y_current * y_current).sqrt();
    let y_bar = if b >= 0.0 {
        (b + root) / (2.0 * r * y_current)
    } else {
        2.0 * y_current / (root - b)
    };

    if y_bar.is_finite() { y_bar } else { 0.0 }
}

/// Applies one LEGO update to `metric` in place.
///
/// `metric` must be symmetric; it is re-symmetrized after the correction so
/// rounding does not accumulate across a long fold.
pub fn lego_update(
    metric: &mut Array2<f64>,
    z: ArrayView1<'_, f64>,
    y: f64,
    r: f64,
) -> UpdateOutcome {
    let az = metric.dot(&z);
    let y_current = z.dot(&az);
    let y_bar = solve_y_bar(y_current, y, r);

    let step = r * (y_bar - y);
    if step == 0.0 {
        return UpdateOutcome::Unchanged { y_current };
    }

    let denominator = 1.0 + step * y_current;
    if !denominator.is_finite() || denominator.abs() <= EPSILON {
        return UpdateOutcome::Skipped {
            y_current,
            denominator,
        };
    }

    let column = az.view().insert_axis(Axis(1));
    let row = az.view().insert_axis(Axis(0));
    metric.scaled_add(-step / denominator, &column.dot(&row));

    let symmetric = (&*metric + &metric.t()) * 0.5;
    metric.assign(&symmetric);

    UpdateOutcome::Applied { y_current, y_bar }
}
