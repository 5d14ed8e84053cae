//! Metric learning: folds pairwise constraints into a Mahalanobis metric
//! and factors it for projection.

mod learner;
mod projector;

pub use learner::{
    Constraint, Label, LearnerParams, MetricFold, MetricMatrix, OnlineMetricLearner,
    UpdateOutcome, lego_update, solve_y_bar,
};
pub use projector::{MetricFactor, Projection, factorize};
