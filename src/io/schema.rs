//! Wire schema for the `update_tags` exchange
//!
//! Requests are parsed leniently at the top level and strictly per tag: a
//! malformed constraint list or positive set only fails its own tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::{BatchOutcome, TagBatch, TagJob};
use crate::error::{RankError, RankResult};
use crate::metric::{Constraint, Label};
use crate::ranking::PositiveSet;

/// Body of `POST /update_tags`
///
/// Tags are the keys of `constraints`; `positiveDocs` entries for other
/// tags are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagsRequest {
    #[serde(default)]
    pub constraints: BTreeMap<String, Value>,
    #[serde(default)]
    pub positive_docs: BTreeMap<String, Value>,
}

/// Third element of a wire constraint; `1` (or `true`) means similar
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum WireLabel {
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl From<WireLabel> for Label {
    fn from(wire: WireLabel) -> Self {
        let similar = match wire {
            WireLabel::Int(v) => v == 1,
            WireLabel::Bool(v) => v,
            WireLabel::Float(v) => v == 1.0,
        };
        if similar {
            Label::Similar
        } else {
            Label::Dissimilar
        }
    }
}

impl UpdateTagsRequest {
    /// Parses a request body. Only a body that is not a JSON object of
    /// the expected shape fails here.
    pub fn from_json(body: &str) -> RankResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| RankError::invalid(format!("malformed request body: {e}")))
    }

    /// Validates every tag into a job, keeping per-tag failures.
    pub fn into_batch(mut self) -> TagBatch {
        let mut batch = TagBatch::new();

        for (tag, constraints) in self.constraints {
            let positives = self.positive_docs.remove(&tag);
            match parse_job(constraints, positives) {
                Ok(job) => batch.push(tag, job),
                Err(e) => batch.push_invalid(tag, e),
            }
        }

        batch
    }
}

fn parse_job(constraints: Value, positives: Option<Value>) -> RankResult<TagJob> {
    let constraints = parse_constraints(constraints)?;
    let positives = positives.ok_or_else(|| RankError::invalid("no positiveDocs for tag"))?;
    let positives: Vec<usize> = serde_json::from_value(positives)
        .map_err(|e| RankError::invalid(format!("positiveDocs must be a list of indices: {e}")))?;
    Ok(TagJob::new(constraints, PositiveSet::new(positives)?))
}

fn parse_constraints(value: Value) -> RankResult<Vec<Constraint>> {
    let triples: Vec<(usize, usize, WireLabel)> = serde_json::from_value(value).map_err(|e| {
        RankError::invalid(format!("constraints must be a list of [u, v, same]: {e}"))
    })?;

    Ok(triples
        .into_iter()
        .map(|(u, v, label)| Constraint::new(u, v, label.into()))
        .collect())
}

/// Error entry for a failed tag or request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl From<&RankError> for ErrorBody {
    fn from(error: &RankError) -> Self {
        Self {
            code: error.status_code(),
            message: error.to_string(),
            suggestions: error
                .recovery_suggestions()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Response of `POST /update_tags`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagsResponse {
    pub dists: BTreeMap<String, Vec<f64>>,
    pub percentiles: BTreeMap<String, Vec<(usize, f64)>>,
    pub percentile_dicts: BTreeMap<String, BTreeMap<usize, f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, ErrorBody>,
}

impl From<BatchOutcome> for UpdateTagsResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let mut response = Self::default();

        for (tag, result) in outcome.into_results() {
            match result {
                Ok(ranking) => {
                    response
                        .percentiles
                        .insert(tag.clone(), ranking.percentile_pairs());
                    response
                        .percentile_dicts
                        .insert(tag.clone(), ranking.percentile_map());
                    response.dists.insert(tag, ranking.distances().to_vec());
                }
                Err(e) => {
                    response.errors.insert(tag, ErrorBody::from(&e));
                }
            }
        }

        response
    }
}
