//! Tag batch orchestration.
//!
//! One request carries any number of tags. Each tag is folded, projected and
//! ranked independently against the collection's shared matrix, on a rayon
//! pool. A tag that fails only records its own error; the matrix failing to
//! load fails the whole batch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::Settings;
use crate::error::{RankError, RankResult};
use crate::metric::{Constraint, OnlineMetricLearner, Projection};
use crate::ranking::{PositiveSet, RankingResult, rank};
use crate::vector::{DocumentMatrix, VectorStore};

/// Validated input for one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagJob {
    pub constraints: Vec<Constraint>,
    pub positives: PositiveSet,
}

impl TagJob {
    pub fn new(constraints: Vec<Constraint>, positives: PositiveSet) -> Self {
        Self {
            constraints,
            positives,
        }
    }
}

/// Tags of one request, each either a valid job or the reason it was rejected.
#[derive(Debug, Default)]
pub struct TagBatch {
    jobs: BTreeMap<String, RankResult<TagJob>>,
}

impl TagBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: impl Into<String>, job: TagJob) {
        self.jobs.insert(tag.into(), Ok(job));
    }

    /// Records a tag whose input failed validation.
    pub fn push_invalid(&mut self, tag: impl Into<String>, error: RankError) {
        self.jobs.insert(tag.into(), Err(error));
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn into_jobs(self) -> BTreeMap<String, RankResult<TagJob>> {
        self.jobs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Per-tag results of a batch, keyed by tag name.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    results: BTreeMap<String, RankResult<RankingResult>>,
}

impl BatchOutcome {
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&RankResult<RankingResult>> {
        self.results.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RankResult<RankingResult>)> {
        self.results.iter().map(|(tag, result)| (tag.as_str(), result))
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &RankingResult)> {
        self.iter()
            .filter_map(|(tag, result)| result.as_ref().ok().map(|r| (tag, r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &RankError)> {
        self.iter()
            .filter_map(|(tag, result)| result.as_ref().err().map(|e| (tag, e)))
    }

    /// Whether every tag ranked successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.values().all(Result::is_ok)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> BTreeMap<String, RankResult<RankingResult>> {
        self.results
    }
}

/// Runs tag batches against collections from a shared [`VectorStore`].
pub struct TagRanker {
    store: Arc<VectorStore>,
    learner: OnlineMetricLearner,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for TagRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRanker")
            .field("store", &self.store)
            .field("learner", &self.learner)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl TagRanker {
    /// Creates a ranker with its own pool of `threads` workers.
    pub fn new(
        store: Arc<VectorStore>,
        learner: OnlineMetricLearner,
        threads: usize,
    ) -> RankResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("tagrank-{i}"))
            .build()
            .map_err(|e| RankError::ConfigError {
                reason: format!("failed to start ranking thread pool: {e}"),
            })?;

        Ok(Self {
            store,
            learner,
            pool,
        })
    }

    /// Builds the store, learner and pool from settings.
    pub fn from_settings(settings: &Settings) -> RankResult<Self> {
        let store = Arc::new(VectorStore::new(settings.resolved_models_dir()));
        let learner = OnlineMetricLearner::new(settings.learner.params()).map_err(|e| {
            RankError::ConfigError {
                reason: format!("[learner] {e}"),
            }
        })?;
        Self::new(store, learner, settings.ranking.parallel_threads)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    #[must_use]
    pub fn learner(&self) -> &OnlineMetricLearner {
        &self.learner
    }

    /// Ranks every tag of `batch` against `collection`.
    ///
    /// Returns `Err` only when the collection's matrix cannot be obtained.
    pub fn process(&self, collection: &str, batch: TagBatch) -> RankResult<BatchOutcome> {
        let docs = self.store.get(collection)?;
        let start = Instant::now();
        let tag_count = batch.len();

        let results: BTreeMap<String, RankResult<RankingResult>> = self.pool.install(|| {
            batch
                .jobs
                .into_par_iter()
                .map(|(tag, job)| {
                    let result = job.and_then(|job| rank_tag(&self.learner, &docs, &tag, &job));
                    if let Err(e) = &result {
                        tracing::warn!("tag '{tag}' failed: {e}");
                    }
                    (tag, result)
                })
                .collect()
        });

        let outcome = BatchOutcome { results };
        tracing::info!(
            "ranked {tag_count} tags for '{collection}' in {:.2?} ({} failed)",
            start.elapsed(),
            outcome.failed().count()
        );
        Ok(outcome)
    }
}

/// Fold, project and rank a single tag.
pub fn rank_tag(
    learner: &OnlineMetricLearner,
    docs: &DocumentMatrix,
    tag: &str,
    job: &TagJob,
) -> RankResult<RankingResult> {
    let start = Instant::now();

    let fold = learner.fold(docs, &job.constraints)?;
    tracing::debug!(
        "[{tag}] folded {} constraints at {:.2?}",
        job.constraints.len(),
        start.elapsed()
    );

    let projection = Projection::from_fold(fold)?;
    if matches!(projection, Projection::Factor(_)) {
        tracing::debug!("[{tag}] factorized metric at {:.2?}", start.elapsed());
    }

    let result = rank(docs, &projection, &job.positives)?;
    tracing::debug!(
        "[{tag}] ranked {} documents against {} exemplars at {:.2?}",
        result.len(),
        job.positives.len(),
        start.elapsed()
    );

    Ok(result)
}
