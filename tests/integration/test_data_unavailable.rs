//! Request-level failures: nothing is ranked when the matrix is missing or unusable.

use crate::common::{TestModels, unit_vectors};
use std::fs;
use tagrank::io::{ExitCode, UpdateTagsRequest};
use tagrank::{RankError, TagBatch};

fn request() -> TagBatch {
    UpdateTagsRequest::from_json(
        r#"{"constraints": {"A": [], "B": [[0, 1, 1]]}, "positiveDocs": {"A": [0], "B": [1]}}"#,
    )
    .unwrap()
    .into_batch()
}

#[test]
fn test_missing_vectors_abort_request() {
    let models = TestModels::new();
    let dir = models.add_collection("toy", &unit_vectors());
    fs::remove_file(dir.join("doc_vectors.npz")).unwrap();

    let err = models.ranker().process("toy", request()).unwrap_err();
    assert!(matches!(err, RankError::DataUnavailable { .. }));
    assert!(err.is_request_fatal());
    assert_eq!(ExitCode::from_error(&err), ExitCode::BlockingError);
}

#[test]
fn test_row_count_mismatch_aborts_request() {
    let models = TestModels::new();
    models.add_collection_declaring("toy", 4, &unit_vectors());

    let err = models.ranker().process("toy", request()).unwrap_err();
    assert_eq!(err.status_code(), "DATA_UNAVAILABLE");
    assert!(err.to_string().contains("declares 4 documents"));
}

#[test]
fn test_corrupt_archive_aborts_request() {
    let models = TestModels::new();
    let dir = models.add_collection("toy", &unit_vectors());
    fs::write(dir.join("doc_vectors.npz"), b"not a zip archive").unwrap();

    let err = models.ranker().process("toy", request()).unwrap_err();
    assert!(matches!(err, RankError::DataUnavailable { .. }));
}

#[test]
fn test_failed_load_is_retried() {
    let models = TestModels::new();
    let ranker = models.ranker();

    assert_eq!(
        ranker.process("late", request()).unwrap_err().status_code(),
        "UNKNOWN_COLLECTION"
    );
    assert!(!ranker.store().contains("late"));

    models.add_collection("late", &unit_vectors());
    let outcome = ranker.process("late", request()).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.len(), 2);
}

#[test]
fn test_missing_collection_directory_is_unknown() {
    let models = TestModels::new();
    let err = models.ranker().process("ghost", request()).unwrap_err();
    assert!(matches!(err, RankError::UnknownCollection { ref name } if name == "ghost"));
    assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
}

#[test]
fn test_path_like_collection_is_unknown() {
    let models = TestModels::new();
    let err = models.ranker().process("../toy", request()).unwrap_err();
    assert!(matches!(err, RankError::UnknownCollection { .. }));
    assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
}
