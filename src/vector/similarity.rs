//! Cosine similarity and centroid helpers over `f64` vectors.
//!
//! Cosine is undefined when either side has zero norm. Callers get `None`
//! from [`cosine_similarity`] in that case and [`cosine_distance`] maps it
//! to the maximal-dissimilarity sentinel.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Norms at or below this are treated as zero.
const EPSILON: f64 = 1e-12;

/// Distance reported when cosine is undefined or not finite.
pub const UNDEFINED_DISTANCE: f64 = 1.0;

/// Computes cosine similarity between two vectors.
///
/// # Returns
/// * `Some(similarity)` in range [-1, 1], or `None` when either vector has zero norm
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Option<f64> {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a <= EPSILON || norm_b <= EPSILON {
        None
    } else {
        Some(dot_product / (norm_a * norm_b))
    }
}

/// Cosine distance `1 - cos(a, b)`, clamped to [`UNDEFINED_DISTANCE`] when
/// the similarity is undefined or the arithmetic produced a non-finite value.
pub fn cosine_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    match cosine_similarity(a, b) {
        Some(similarity) => {
            let distance = 1.0 - similarity;
            if distance.is_finite() {
                distance
            } else {
                UNDEFINED_DISTANCE
            }
        }
        None => UNDEFINED_DISTANCE,
    }
}

/// Arithmetic mean of the selected rows. Duplicate indices are weighted
/// by multiplicity. Returns `None` for an empty selection.
pub fn mean_of_rows(rows: ArrayView2<'_, f64>, indices: &[usize]) -> Option<Array1<f64>> {
    if indices.is_empty() {
        return None;
    }
    let selected = rows.select(Axis(0), indices);
    selected.mean_axis(Axis(0))
}
