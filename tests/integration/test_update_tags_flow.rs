//! End-to-end `update_tags` flow: JSON request in, JSON response out.

use crate::common::{TestModels, assert_close, unit_vectors};
use serde_json::json;
use tagrank::io::{UpdateTagsRequest, UpdateTagsResponse};
use tagrank::metric::{MetricMatrix, factorize};
use tagrank::{DocumentMatrix, PositiveSet, Projection, rank};

fn run(models: &TestModels, collection: &str, body: serde_json::Value) -> UpdateTagsResponse {
    let request = UpdateTagsRequest::from_json(&body.to_string()).unwrap();
    let outcome = models
        .ranker()
        .process(collection, request.into_batch())
        .unwrap();
    UpdateTagsResponse::from(outcome)
}

#[test]
fn test_single_tag_without_constraints() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());

    let response = run(
        &models,
        "toy",
        json!({"constraints": {"A": []}, "positiveDocs": {"A": [0]}}),
    );

    assert!(response.errors.is_empty());
    assert_close(
        &response.dists["A"],
        &[0.0, 1.0, 1.0 - 1.0 / 2.0_f64.sqrt()],
        1e-4,
    );

    let dict = &response.percentile_dicts["A"];
    assert!((dict[&0] - 1.0 / 3.0).abs() < 1e-12);
    assert!((dict[&2] - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(dict[&1], 1.0);

    // Pair list and dictionary describe the same ranking
    for (index, percentile) in &response.percentiles["A"] {
        assert_eq!(dict[index], *percentile);
    }
}

#[test]
fn test_response_json_shape() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());

    let response = run(
        &models,
        "toy",
        json!({"constraints": {"A": []}, "positiveDocs": {"A": [1]}}),
    );
    let value = serde_json::to_value(&response).unwrap();

    assert!(value["dists"]["A"].is_array());
    assert_eq!(value["percentiles"]["A"][0][0], json!(0));
    assert_eq!(value["percentileDicts"]["A"]["1"], json!(1.0 / 3.0));
    assert!(value.get("errors").is_none());
}

#[test]
fn test_failed_tag_does_not_affect_siblings() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());

    let response = run(
        &models,
        "toy",
        json!({
            "constraints": {
                "ok": [[0, 2, 1]],
                "bad_index": [[0, 42, 1]],
                "no_positives": [],
                "empty_positives": []
            },
            "positiveDocs": {"ok": [0], "bad_index": [0], "empty_positives": []}
        }),
    );

    assert_eq!(response.dists.len(), 1);
    assert_eq!(response.dists["ok"].len(), 3);
    assert_eq!(response.errors.len(), 3);
    for tag in ["bad_index", "no_positives", "empty_positives"] {
        assert_eq!(response.errors[tag].code, "INVALID_REQUEST", "{tag}");
    }
}

#[test]
fn test_tags_are_independent() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());

    let alone = run(
        &models,
        "toy",
        json!({"constraints": {"A": [[0, 2, 1]]}, "positiveDocs": {"A": [0]}}),
    );
    let together = run(
        &models,
        "toy",
        json!({
            "constraints": {"A": [[0, 2, 1]], "B": [[0, 1, 0], [1, 2, 1]]},
            "positiveDocs": {"A": [0], "B": [2]}
        }),
    );

    assert_eq!(alone.dists["A"], together.dists["A"]);
    assert_eq!(alone.percentiles["A"], together.percentiles["A"]);
}

#[test]
fn test_identity_fast_path_matches_factored_identity() {
    let docs = DocumentMatrix::new(unit_vectors()).unwrap();
    let positives = PositiveSet::new([0, 2]).unwrap();

    let fast = rank(&docs, &Projection::Identity, &positives).unwrap();
    let factored = Projection::Factor(factorize(&MetricMatrix::identity(2)).unwrap());
    let slow = rank(&docs, &factored, &positives).unwrap();

    assert_close(fast.distances(), slow.distances(), 1e-12);
    assert_eq!(fast.percentiles(), slow.percentiles());
}

#[test]
fn test_duplicate_positives_weight_the_mean() {
    let docs = DocumentMatrix::new(unit_vectors()).unwrap();

    let once = rank(
        &docs,
        &Projection::Identity,
        &PositiveSet::new([0, 1]).unwrap(),
    )
    .unwrap();
    let weighted = rank(
        &docs,
        &Projection::Identity,
        &PositiveSet::new([0, 0, 1]).unwrap(),
    )
    .unwrap();

    // Equal weights: both axes are equally far from the mean
    assert!((once.distances()[0] - once.distances()[1]).abs() < 1e-12);
    // Doubling doc 0 pulls the mean toward it
    assert!(weighted.distances()[0] < weighted.distances()[1]);
}
