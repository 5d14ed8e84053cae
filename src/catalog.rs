//! Collection discovery and document access.
//!
//! A collection is a sub-directory of the models directory holding a
//! `params.json`, the vector archive and a directory of `.txt` documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Metadata file written by the preprocessing pipeline.
pub const PARAMS_FILE: &str = "params.json";

/// Extension of document text files.
pub const DOC_EXTENSION: &str = "txt";

/// Width digit runs are padded to when ordering document names.
const NATURAL_PAD: usize = 20;

/// Contents of a collection's `params.json`.
///
/// Only `text_dir` and `num_documents` are required; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionParams {
    pub text_dir: String,
    pub num_documents: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_chars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_words: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_words: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_vocab_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_pattern: Option<String>,
}

impl CollectionParams {
    pub fn new(text_dir: impl Into<String>, num_documents: usize) -> Self {
        Self {
            text_dir: text_dir.into(),
            num_documents,
            total_chars: None,
            avg_chars: None,
            total_words: None,
            avg_words: None,
            embedding_model: None,
            vocab_size: None,
            uncompressed_vocab_size: None,
            token_pattern: None,
        }
    }

    /// Reads `<dir>/params.json`.
    pub fn read(dir: &Path) -> CatalogResult<Self> {
        let path = dir.join(PARAMS_FILE);
        let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Json { path, source })
    }
}

/// A collection name with its parameters, as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub params: CollectionParams,
}

/// Rejects names that could escape their parent directory.
pub fn validate_name(name: &str) -> CatalogResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(CatalogError::InvalidDocumentName(name.to_string()));
    }
    Ok(())
}

/// Sort key placing `doc2` before `doc10`.
fn natural_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + NATURAL_PAD);
    let mut digits = String::new();

    for c in name.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            key.push_str(&format!("{digits:0>NATURAL_PAD$}"));
            digits.clear();
        }
        key.push(c);
    }
    if !digits.is_empty() {
        key.push_str(&format!("{digits:0>NATURAL_PAD$}"));
    }
    key
}

/// Read-only view over the collections in a models directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    models_dir: PathBuf,
}

impl Catalog {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// All collections, sorted by name.
    ///
    /// Sub-directories without a readable `params.json` are skipped with a warning.
    pub fn list_collections(&self) -> CatalogResult<Vec<CollectionInfo>> {
        let entries = fs::read_dir(&self.models_dir).map_err(|source| CatalogError::Io {
            path: self.models_dir.clone(),
            source,
        })?;

        let mut collections = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match CollectionParams::read(&path) {
                Ok(params) => collections.push(CollectionInfo {
                    name: name.to_string(),
                    params,
                }),
                Err(e) => tracing::warn!("skipping collection directory '{name}': {e}"),
            }
        }

        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }

    /// Parameters of one collection.
    pub fn params(&self, collection: &str) -> CatalogResult<CollectionParams> {
        let dir = self.collection_dir(collection)?;
        CollectionParams::read(&dir).map_err(|e| match e {
            CatalogError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                CatalogError::UnknownCollection(collection.to_string())
            }
            other => other,
        })
    }

    /// Document names of a collection in natural order, without extension.
    pub fn list_documents(&self, collection: &str) -> CatalogResult<Vec<String>> {
        let text_dir = self.text_dir(collection)?;
        let entries = fs::read_dir(&text_dir).map_err(|source| CatalogError::Io {
            path: text_dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(DOC_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .collect();

        names.sort_by_cached_key(|name| natural_key(name));
        Ok(names)
    }

    /// Full text of one document.
    pub fn get_document(&self, collection: &str, document: &str) -> CatalogResult<String> {
        validate_name(document)?;
        let path = self
            .text_dir(collection)?
            .join(format!("{document}.{DOC_EXTENSION}"));
        fs::read_to_string(&path).map_err(|source| CatalogError::Io { path, source })
    }

    fn collection_dir(&self, collection: &str) -> CatalogResult<PathBuf> {
        validate_name(collection)
            .map_err(|_| CatalogError::UnknownCollection(collection.to_string()))?;
        Ok(self.models_dir.join(collection))
    }

    fn text_dir(&self, collection: &str) -> CatalogResult<PathBuf> {
        let params = self.params(collection)?;
        Ok(self.collection_dir(collection)?.join(params.text_dir))
    }
}
