//! Distance and percentile ranking of documents against a tag's exemplars.
//!
//! # Algorithm
//! 1. Project every document vector with the tag's metric (or leave it as is)
//! 2. Average the projected exemplar rows into a mean vector
//! 3. Cosine distance from every document to that mean (undefined -> 1.0)
//! 4. Average-rank percentiles over the N distances

mod percentile;
mod ranker;

pub use percentile::average_rank_percentiles;
pub use ranker::{PositiveSet, RankingResult, rank};
