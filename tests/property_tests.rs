use ndarray::{Array1, Array2};
use proptest::prelude::*;
use tagrank::metric::{MetricMatrix, factorize};
use tagrank::ranking::average_rank_percentiles;
use tagrank::{Constraint, DocumentMatrix, OnlineMetricLearner, PositiveSet, Projection, rank};

/// Row-major document matrix with bounded entries.
fn documents() -> impl Strategy<Value = Array2<f64>> {
    (2usize..6, 1usize..4).prop_flat_map(|(n, d)| {
        prop::collection::vec(-5.0f64..5.0, n * d).prop_map(move |values| {
            Array2::from_shape_vec((n, d), values).expect("shape matches length")
        })
    })
}

fn documents_with_constraints() -> impl Strategy<Value = (Array2<f64>, Vec<Constraint>)> {
    documents().prop_flat_map(|docs| {
        let n = docs.nrows();
        let constraints = prop::collection::vec((0..n, 0..n, any::<bool>()), 0..8).prop_map(
            |triples| {
                triples
                    .into_iter()
                    .map(|(u, v, same)| {
                        if same {
                            Constraint::similar(u, v)
                        } else {
                            Constraint::dissimilar(u, v)
                        }
                    })
                    .collect::<Vec<_>>()
            },
        );
        (Just(docs), constraints)
    })
}

fn naive_percentiles(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    values
        .iter()
        .map(|v| {
            let less = values.iter().filter(|w| *w < v).count() as f64;
            let equal = values.iter().filter(|w| *w == v).count() as f64;
            (less + (equal + 1.0) / 2.0) / n
        })
        .collect()
}

proptest! {
    #[test]
    fn folded_metric_is_symmetric_psd((vectors, constraints) in documents_with_constraints()) {
        let docs = DocumentMatrix::new(vectors).unwrap();
        let metric = OnlineMetricLearner::default()
            .fold(&docs, &constraints)
            .unwrap()
            .into_matrix();

        prop_assert!(metric.asymmetry() < 1e-12);

        let scale = 1.0 + metric.view().iter().fold(0.0f64, |m, x| m.max(x.abs()));
        let rows = docs.view();
        for i in 0..docs.n_docs() {
            for j in 0..docs.n_docs() {
                let z: Array1<f64> = &rows.row(i) - &rows.row(j);
                prop_assert!(metric.squared_norm(z.view()) >= -1e-9 * scale * z.dot(&z).max(1.0));
            }
        }

        let mut shifted = metric.view().to_owned();
        for k in 0..metric.dimension() {
            shifted[[k, k]] += 1e-8 * scale;
        }
        prop_assert!(factorize(&MetricMatrix::from_array(shifted).unwrap()).is_ok());
    }

    #[test]
    fn fold_is_bit_identical((vectors, constraints) in documents_with_constraints()) {
        let docs = DocumentMatrix::new(vectors).unwrap();
        let learner = OnlineMetricLearner::default();
        let first = learner.fold(&docs, &constraints).unwrap();
        let second = learner.fold(&docs, &constraints).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn no_constraints_ranks_by_plain_cosine(
        vectors in documents(),
        pick in any::<prop::sample::Index>()
    ) {
        let docs = DocumentMatrix::new(vectors).unwrap();
        let positive = pick.index(docs.n_docs());
        let positives = PositiveSet::new([positive]).unwrap();
        let result = rank(&docs, &Projection::Identity, &positives).unwrap();

        let rows = docs.view();
        let mean = rows.row(positive);
        for (i, row) in rows.rows().into_iter().enumerate() {
            let denom = row.dot(&row).sqrt() * mean.dot(&mean).sqrt();
            let expected = if denom > 1e-12 { 1.0 - row.dot(&mean) / denom } else { 1.0 };
            prop_assert!((result.distances()[i] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn distinct_distances_give_rank_permutation(
        values in prop::collection::hash_set(-1000i32..1000, 1..40)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let distances: Vec<f64> = values.into_iter().map(f64::from).collect();
        let n = distances.len();

        let mut percentiles = average_rank_percentiles(&distances);
        percentiles.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (1..=n).map(|k| k as f64 / n as f64).collect();
        for (p, e) in percentiles.iter().zip(&expected) {
            prop_assert!((p - e).abs() < 1e-12);
        }
    }

    #[test]
    fn tied_distances_share_average_rank(values in prop::collection::vec(0u8..4, 1..30)) {
        let distances: Vec<f64> = values.into_iter().map(f64::from).collect();
        let percentiles = average_rank_percentiles(&distances);
        for (p, e) in percentiles.iter().zip(naive_percentiles(&distances)) {
            prop_assert!((p - e).abs() < 1e-12);
        }
    }
}
