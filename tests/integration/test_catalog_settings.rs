//! Catalog discovery against a configured models directory.

use crate::common::{TestModels, unit_vectors};
use ndarray::Array2;
use std::fs;
use tagrank::{Catalog, CatalogError, Settings, TagRanker};

#[test]
fn test_catalog_lists_fixture_collections() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());
    models.add_collection("bigger", &Array2::from_shape_fn((11, 1), |(i, _)| i as f64 + 1.0));

    let catalog = Catalog::new(models.path());
    let collections = catalog.list_collections().unwrap();
    let names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["bigger", "toy"]);
    assert_eq!(
        collections[0].params.embedding_model.as_deref(),
        Some("tfidf")
    );

    let documents = catalog.list_documents("bigger").unwrap();
    assert_eq!(documents.first().map(String::as_str), Some("doc0"));
    assert_eq!(documents[2], "doc2");
    assert_eq!(documents.last().map(String::as_str), Some("doc10"));

    assert_eq!(catalog.get_document("toy", "doc1").unwrap(), "text 1");
    assert!(matches!(
        catalog.get_document("ghost", "doc1").unwrap_err(),
        CatalogError::UnknownCollection(_)
    ));
}

#[test]
fn test_settings_drive_ranker() {
    let models = TestModels::new();
    models.add_collection("toy", &unit_vectors());

    let settings_path = models.path().join("settings.toml");
    fs::write(
        &settings_path,
        format!(
            r#"
models_dir = "{}"

[learner]
regularization = 0.25

[ranking]
parallel_threads = 1
"#,
            models.path().display()
        ),
    )
    .unwrap();

    let settings = Settings::load_from(&settings_path).unwrap();
    assert_eq!(settings.learner.regularization, 0.25);
    assert_eq!(settings.learner.target_same, 7.0);
    assert_eq!(settings.resolved_models_dir(), models.path());

    let ranker = TagRanker::from_settings(&settings).unwrap();
    assert_eq!(ranker.learner().params().regularization, 0.25);
    assert!(ranker.store().get("toy").is_ok());
}

#[test]
fn test_invalid_hyperparameters_are_config_errors() {
    let mut settings = Settings::default();
    settings.learner.regularization = -1.0;

    let err = TagRanker::from_settings(&settings).unwrap_err();
    assert_eq!(err.status_code(), "CONFIG_ERROR");
}
