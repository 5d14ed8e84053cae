//! Core types for the document-vector matrix.
//!
//! The matrix is loaded once per collection and shared read-only behind an
//! `Arc`, so every accessor here takes `&self`.

use ndarray::{Array2, ArrayView1, ArrayView2};
use thiserror::Error;

/// Type-safe wrapper for a document's row index in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocIndex(usize);

impl DocIndex {
    /// Creates a new `DocIndex`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying row index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for DocIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable N×D matrix of document vectors, one row per document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMatrix {
    vectors: Array2<f64>,
}

impl DocumentMatrix {
    /// Wraps a dense matrix, rejecting empty shapes.
    pub fn new(vectors: Array2<f64>) -> Result<Self, VectorError> {
        let (rows, cols) = vectors.dim();
        if rows == 0 {
            return Err(VectorError::EmptyMatrix);
        }
        if cols == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self { vectors })
    }

    /// Builds a matrix from row vectors. All rows must share one dimension.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, VectorError> {
        let first = rows.first().ok_or(VectorError::EmptyMatrix)?;
        let dimension = first.len();

        let mut flat = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            if row.len() != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let vectors = Array2::from_shape_vec((rows.len(), dimension), flat)
            .map_err(|e| VectorError::Shape(e.to_string()))?;
        Self::new(vectors)
    }

    /// Number of documents (N).
    #[must_use]
    pub fn n_docs(&self) -> usize {
        self.vectors.nrows()
    }

    /// Number of features per document (D).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Full read-only view of the matrix.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.vectors.view()
    }

    /// Row for one document, checked against N.
    pub fn row(&self, index: DocIndex) -> Result<ArrayView1<'_, f64>, VectorError> {
        self.check_index(index)?;
        Ok(self.vectors.row(index.get()))
    }

    /// Validates that an index addresses an existing document.
    pub fn check_index(&self, index: DocIndex) -> Result<(), VectorError> {
        if index.get() >= self.n_docs() {
            return Err(VectorError::IndexOutOfRange {
                index: index.get(),
                n_docs: self.n_docs(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same preprocessing run"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Document matrix has no rows")]
    EmptyMatrix,

    #[error(
        "Document index {index} out of range for {n_docs} documents\nSuggestion: Indices are 0-based row numbers in list_documents order"
    )]
    IndexOutOfRange { index: usize, n_docs: usize },

    #[error("Invalid matrix shape: {0}")]
    Shape(String),
}
