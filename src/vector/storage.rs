//! Per-collection cache of document-vector matrices.
//!
//! Each collection's matrix is read from `<models_dir>/<collection>/doc_vectors.npz`
//! on first access and kept for the lifetime of the process.
//!
//! # Lifecycle
//!
//! - Slot creation: the first `get` for a key inserts an empty slot into the map.
//! - Initialization: one caller runs the load inside `OnceCell::get_or_try_init`.
//!   Concurrent first accesses to the same key block on that cell and then
//!   read the filled value, so each matrix is loaded once. Different keys
//!   load in parallel.
//! - Failure: a failed load leaves the cell empty; the next `get` retries.
//! - Reads: a filled cell is read without locking. The matrix is never
//!   mutated after initialization and is handed out as `Arc<DocumentMatrix>`.
//!
//! A collection without a directory (or without `params.json`) is unknown.
//! A collection that exists but whose vectors cannot be used is unavailable.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use ndarray::Array2;
use ndarray_npy::NpzReader;
use once_cell::sync::OnceCell;

use crate::catalog::{CollectionParams, validate_name};
use crate::error::{CatalogError, RankError, RankResult};
use crate::vector::DocumentMatrix;

/// File name of the per-collection vector archive.
pub const VECTORS_FILE: &str = "doc_vectors.npz";

type Slot = Arc<OnceCell<Arc<DocumentMatrix>>>;

/// Process-wide store of document matrices keyed by collection name.
#[derive(Debug)]
pub struct VectorStore {
    models_dir: PathBuf,
    slots: DashMap<String, Slot>,
}

impl VectorStore {
    /// Creates an empty store reading collections under `models_dir`.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            slots: DashMap::new(),
        }
    }

    /// Returns the matrix for `collection`, loading it on first access.
    pub fn get(&self, collection: &str) -> RankResult<Arc<DocumentMatrix>> {
        // Shard guard is released before `entry` takes the write lock
        let existing = self.slots.get(collection).map(|slot| Arc::clone(slot.value()));
        let slot = match existing {
            Some(slot) => slot,
            None => Arc::clone(self.slots.entry(collection.to_string()).or_default().value()),
        };

        slot.get_or_try_init(|| self.load(collection).map(Arc::new)).map(Arc::clone)
    }

    /// Registers an already materialized matrix, replacing any cached one.
    pub fn insert(&self, collection: &str, matrix: DocumentMatrix) -> Arc<DocumentMatrix> {
        let matrix = Arc::new(matrix);
        self.slots.insert(
            collection.to_string(),
            Arc::new(OnceCell::with_value(Arc::clone(&matrix))),
        );
        matrix
    }

    /// Whether a matrix for `collection` is loaded.
    #[must_use]
    pub fn contains(&self, collection: &str) -> bool {
        self.slots
            .get(collection)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of loaded matrices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the cached matrix for `collection`. Outstanding `Arc`s stay valid.
    pub fn evict(&self, collection: &str) -> bool {
        self.slots.remove(collection).is_some()
    }

    /// Directory collections are read from.
    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn load(&self, collection: &str) -> RankResult<DocumentMatrix> {
        validate_name(collection).map_err(|_| RankError::UnknownCollection {
            name: collection.to_string(),
        })?;

        let dir = self.models_dir.join(collection);
        let params = CollectionParams::read(&dir).map_err(|e| match e {
            CatalogError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                RankError::UnknownCollection {
                    name: collection.to_string(),
                }
            }
            other => RankError::unavailable(collection, other.to_string()),
        })?;

        let path = dir.join(VECTORS_FILE);
        tracing::debug!("loading document vectors from {}", path.display());

        let vectors = read_single_array(&path)
            .map_err(|reason| RankError::unavailable(collection, reason))?;

        if vectors.nrows() != params.num_documents {
            return Err(RankError::unavailable(
                collection,
                format!(
                    "{} has {} rows but params.json declares {} documents",
                    path.display(),
                    vectors.nrows(),
                    params.num_documents
                ),
            ));
        }

        let matrix = DocumentMatrix::new(vectors)
            .map_err(|e| RankError::unavailable(collection, e.to_string()))?;

        tracing::info!(
            "loaded collection '{collection}': {} documents x {} features",
            matrix.n_docs(),
            matrix.dimension()
        );
        Ok(matrix)
    }
}

/// Reads the first (and normally only) array of a `.npz` archive as 2-D `f64`.
fn read_single_array(path: &Path) -> Result<Array2<f64>, String> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let mut npz =
        NpzReader::new(file).map_err(|e| format!("{} is not an npz archive: {e}", path.display()))?;

    let names = npz
        .names()
        .map_err(|e| format!("cannot list arrays in {}: {e}", path.display()))?;
    match names.len() {
        0 => return Err(format!("{} contains no arrays", path.display())),
        1 => {}
        n => tracing::warn!(
            "{} contains {n} arrays, using the first ({})",
            path.display(),
            names[0]
        ),
    }

    npz.by_index(0)
        .map_err(|e| format!("cannot read a 2-D f64 array from {}: {e}", path.display()))
}
