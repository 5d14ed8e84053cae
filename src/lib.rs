//! Online metric learning and tie-aware ranking for document re-tagging.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod metric;
pub mod ranking;
#[cfg(feature = "http-server")]
pub mod server;
pub mod vector;

// Explicit exports for better API clarity
pub use batch::{BatchOutcome, TagBatch, TagJob, TagRanker};
pub use catalog::{Catalog, CollectionInfo, CollectionParams};
pub use config::Settings;
pub use error::{CatalogError, CatalogResult, RankError, RankResult};
pub use metric::{Constraint, Label, LearnerParams, OnlineMetricLearner, Projection};
pub use ranking::{PositiveSet, RankingResult, rank};
pub use vector::{DocIndex, DocumentMatrix, VectorStore};
