/// Scoring Backends
///
/// Every engine operation runs through a `RankingBackend`. Two exist:
/// - **Reference**: scalar implementations, always available
/// - **Vectorized**: batch scoring and clustering over `ndarray` matrices,
///   built only after it passes a self-check against the reference
///
/// Both must produce the same orderings and aggregates; scores may differ
/// by floating-point rounding only.
pub mod vectorized;

pub use vectorized::VectorizedBackend;

use crate::config::ClusteringConfig;
use crate::error::Result;
use crate::models::{
    ColumnAssignment, ConsensusResult, FeedSlice, LayoutItem, RankablePost, RankingStrategy,
    RemixResult, Statement, Vote,
};
use crate::services::{consensus, masonry, ranking, remix};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Reference,
    Vectorized,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Reference => "reference",
            BackendKind::Vectorized => "vectorized",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait RankingBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn rank(
        &self,
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Vec<RankablePost>;

    fn analyze_consensus(&self, statements: &[Statement], votes: &[Vote])
        -> Result<ConsensusResult>;

    fn remix(&self, slices: &[FeedSlice], limit: usize) -> Result<RemixResult> {
        remix::remix_feeds(slices, limit)
    }

    fn distribute_columns(
        &self,
        items: &[LayoutItem],
        columns: usize,
    ) -> Result<Vec<ColumnAssignment>> {
        masonry::distribute_columns(items, columns)
    }
}

/// Scalar implementation of every operation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBackend {
    clustering: ClusteringConfig,
}

impl ReferenceBackend {
    pub fn new(clustering: ClusteringConfig) -> Self {
        Self { clustering }
    }
}

impl RankingBackend for ReferenceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn rank(
        &self,
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Vec<RankablePost> {
        ranking::rank_posts(posts, strategy, now)
    }

    fn analyze_consensus(
        &self,
        statements: &[Statement],
        votes: &[Vote],
    ) -> Result<ConsensusResult> {
        consensus::analyze_consensus_with_statements(statements, votes, &self.clustering)
    }
}
