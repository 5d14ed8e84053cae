//! Document-vector storage for ranking.
//!
//! This module owns the immutable N×D matrix each collection is ranked
//! against, and the cosine helpers the ranker measures distances with.
//!
//! # Architecture
//! Matrices are produced offline (one `doc_vectors.npz` per collection) and
//! loaded lazily by [`VectorStore`], which keeps one `Arc<DocumentMatrix>`
//! per collection for the lifetime of the process.

mod similarity;
mod storage;
mod types;

// Re-export core types for public API
pub use similarity::{UNDEFINED_DISTANCE, cosine_distance, cosine_similarity, mean_of_rows};
pub use storage::{VECTORS_FILE, VectorStore};
pub use types::{DocIndex, DocumentMatrix, VectorError};
