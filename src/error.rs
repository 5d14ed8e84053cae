//! Error types for the ranking engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.
//!
//! Errors fall into two propagation classes:
//! - request-fatal: the collection's vectors cannot be loaded, nothing can run
//! - tag-fatal: one tag's request or fold is bad, sibling tags still complete

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ranking operations
#[derive(Error, Debug)]
pub enum RankError {
    /// Vector matrix missing, unreadable or inconsistent with the collection
    #[error(
        "Document vectors for collection '{collection}' are unavailable: {reason}\nSuggestion: Re-run the preprocessing pipeline for this collection"
    )]
    DataUnavailable { collection: String, reason: String },

    #[error("Collection '{name}' not found\nSuggestion: Check the collection name against 'tagrank collections'")]
    UnknownCollection { name: String },

    /// Malformed or inconsistent per-tag input
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Folded metric is not positive definite
    #[error(
        "Metric matrix is not positive definite (pivot {pivot:e} at column {column})\nSuggestion: Remove contradictory constraints for this tag"
    )]
    NumericalInstability { column: usize, pivot: f64 },

    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl RankError {
    /// Shorthand for an [`RankError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`RankError::DataUnavailable`].
    pub fn unavailable(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::DataUnavailable { .. } => "DATA_UNAVAILABLE",
            Self::UnknownCollection { .. } => "UNKNOWN_COLLECTION",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::NumericalInstability { .. } => "NUMERICAL_INSTABILITY",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Whether this error aborts the whole request rather than a single tag.
    #[must_use]
    pub fn is_request_fatal(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. }
                | Self::UnknownCollection { .. }
                | Self::FileRead { .. }
                | Self::ConfigError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DataUnavailable { .. } => vec![
                "Check that doc_vectors.npz exists in the collection directory",
                "Verify num_documents in params.json matches the matrix row count",
            ],
            Self::NumericalInstability { .. } => vec![
                "Constraints that mark the same pair both similar and dissimilar can collapse the metric",
                "Retry the tag with fewer constraints",
            ],
            Self::UnknownCollection { .. } => vec![
                "Run 'tagrank collections' to list available collections",
                "Check models_dir in .tagrank/settings.toml",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            _ => vec![],
        }
    }
}

/// Errors raised while reading collection metadata and documents
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed params.json at '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Collection '{0}' not found")]
    UnknownCollection(String),

    #[error("Invalid document name '{0}'\nSuggestion: Use a name from 'tagrank documents <collection>'")]
    InvalidDocumentName(String),
}

impl From<CatalogError> for RankError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io { path, source } => RankError::FileRead { path, source },
            CatalogError::Json { path, source } => RankError::ConfigError {
                reason: format!("{}: {source}", path.display()),
            },
            CatalogError::UnknownCollection(name) => RankError::UnknownCollection { name },
            CatalogError::InvalidDocumentName(name) => {
                RankError::invalid(format!("invalid document name '{name}'"))
            }
        }
    }
}

/// Result type alias for ranking operations
pub type RankResult<T> = Result<T, RankError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
