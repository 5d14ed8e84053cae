#![allow(dead_code)]

use ndarray::{Array2, array};
use ndarray_npy::NpzWriter;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagrank::{OnlineMetricLearner, TagRanker, VectorStore};
use tempfile::TempDir;

/// A throwaway models directory with collections written the way the
/// preprocessing pipeline lays them out.
pub struct TestModels {
    pub dir: TempDir,
}

impl TestModels {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a consistent collection: params, one text file per row, vectors.
    pub fn add_collection(&self, name: &str, vectors: &Array2<f64>) -> PathBuf {
        self.add_collection_declaring(name, vectors.nrows(), vectors)
    }

    /// Writes a collection whose `params.json` declares `declared` documents.
    pub fn add_collection_declaring(
        &self,
        name: &str,
        declared: usize,
        vectors: &Array2<f64>,
    ) -> PathBuf {
        let dir = self.path().join(name);
        fs::create_dir_all(dir.join("text")).expect("Failed to create collection dirs");
        fs::write(
            dir.join("params.json"),
            format!(
                r#"{{"text_dir": "text", "num_documents": {declared}, "embedding_model": "tfidf"}}"#
            ),
        )
        .expect("Failed to write params.json");

        for i in 0..vectors.nrows() {
            fs::write(dir.join("text").join(format!("doc{i}.txt")), format!("text {i}"))
                .expect("Failed to write document");
        }

        let file = File::create(dir.join("doc_vectors.npz")).expect("Failed to create npz");
        let mut npz = NpzWriter::new_compressed(file);
        npz.add_array("arr_0", vectors).expect("Failed to add array");
        npz.finish().expect("Failed to finish npz");
        dir
    }

    /// A ranker over this models directory with default hyperparameters.
    pub fn ranker(&self) -> TagRanker {
        let store = Arc::new(VectorStore::new(self.path()));
        TagRanker::new(store, OnlineMetricLearner::default(), 2).expect("Failed to build ranker")
    }
}

/// Three documents on the unit square.
pub fn unit_vectors() -> Array2<f64> {
    array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
}

/// The same layout scaled so pair distances exceed the similar target.
pub fn scaled_vectors() -> Array2<f64> {
    array![[10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < tol, "{actual:?} vs {expected:?}");
    }
}
