//! A similar constraint pulls its pair together in the learned metric.

use crate::common::{TestModels, assert_close, scaled_vectors, unit_vectors};
use ndarray::array;
use tagrank::batch::rank_tag;
use tagrank::{Constraint, DocumentMatrix, OnlineMetricLearner, PositiveSet, TagJob};

fn job(constraints: Vec<Constraint>) -> TagJob {
    TagJob::new(constraints, PositiveSet::new([0]).unwrap())
}

#[test]
fn test_similar_constraint_shrinks_distance_above_target() {
    let docs = DocumentMatrix::new(scaled_vectors()).unwrap();
    let learner = OnlineMetricLearner::default();

    let baseline = rank_tag(&learner, &docs, "A", &job(vec![])).unwrap();
    let learned = rank_tag(&learner, &docs, "A", &job(vec![Constraint::similar(0, 1)])).unwrap();

    assert_close(
        baseline.distances(),
        &[0.0, 1.0, 1.0 - 1.0 / 2.0_f64.sqrt()],
        1e-9,
    );
    assert_close(learned.distances(), &[0.0, 0.070106, 0.017683], 1e-5);
    assert!(learned.distances()[1] < baseline.distances()[1]);

    // Mahalanobis squared distance lands on the update target
    let metric = learner
        .fold(&docs, &[Constraint::similar(0, 1)])
        .unwrap()
        .into_matrix();
    let z = array![10.0, -10.0];
    let after = metric.squared_norm(z.view());
    assert!((after - 7.265_281_819_705).abs() < 1e-6, "after = {after}");
    assert!(after < 200.0);
}

#[test]
fn test_similar_constraint_below_target_moves_up_toward_it() {
    let docs = DocumentMatrix::new(unit_vectors()).unwrap();
    let learner = OnlineMetricLearner::default();

    let metric = learner
        .fold(&docs, &[Constraint::similar(0, 1)])
        .unwrap()
        .into_matrix();
    let after = metric.squared_norm(array![1.0, -1.0].view());

    // Baseline is 2, the similar target is 7
    assert!(after > 2.0 && after < 7.0, "after = {after}");
}

#[test]
fn test_dissimilar_constraint_pushes_pair_apart() {
    let docs = DocumentMatrix::new(unit_vectors()).unwrap();
    let learner = OnlineMetricLearner::default();

    let metric = learner
        .fold(&docs, &[Constraint::dissimilar(0, 1)])
        .unwrap()
        .into_matrix();
    let after = metric.squared_norm(array![1.0, -1.0].view());
    assert!(after > 2.0 && after < 10.0, "after = {after}");
}

#[test]
fn test_effect_through_the_ranker() {
    let models = TestModels::new();
    models.add_collection("scaled", &scaled_vectors());
    let ranker = models.ranker();

    let mut batch = tagrank::TagBatch::new();
    batch.push("plain", job(vec![]));
    batch.push("learned", job(vec![Constraint::similar(0, 1)]));
    let outcome = ranker.process("scaled", batch).unwrap();

    let plain = outcome.get("plain").unwrap().as_ref().unwrap();
    let learned = outcome.get("learned").unwrap().as_ref().unwrap();
    assert!(learned.distances()[1] < plain.distances()[1]);
    // Ordering is unchanged, so percentiles agree
    assert_eq!(plain.percentiles(), learned.percentiles());
}
