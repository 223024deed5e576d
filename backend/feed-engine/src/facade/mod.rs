// ============================================
// Engine Facade
// ============================================
//
// One entry point per engine operation. The facade owns a single lazily
// initialized `EngineHandle`: the first caller runs the backend loader,
// concurrent callers wait on that same initialization, and afterwards every
// operation is a plain synchronous call on the resolved handle.
//
// Loader failures are retried only inside that one initialization. When all
// attempts fail the facade settles on the reference backend for good.

pub mod loader;
pub mod protocol;

pub use loader::{BackendLoader, VectorizedLoader};
pub use protocol::{EngineRequest, EngineResponse, Timestamp};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    ColumnAssignment, ConsensusResult, FeedSlice, ForumThread, LayoutItem, RankablePost,
    RankingStrategy, RemixResult, Statement, Vote, VoteCount, VoteSummary,
};
use crate::services::backend::{BackendKind, RankingBackend, ReferenceBackend};
use crate::services::ranking;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Resolved engine: a fixed backend plus the synchronous operations.
#[derive(Clone)]
pub struct EngineHandle {
    backend: Arc<dyn RankingBackend>,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn RankingBackend>) -> Self {
        Self { backend }
    }

    pub fn reference(config: &EngineConfig) -> Self {
        Self::new(Arc::new(ReferenceBackend::new(config.clustering())))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn rank(
        &self,
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Vec<RankablePost> {
        self.backend.rank(posts, strategy, now)
    }

    pub fn remix(&self, slices: &[FeedSlice], limit: usize) -> Result<RemixResult> {
        self.backend.remix(slices, limit)
    }

    pub fn distribute_columns(
        &self,
        items: &[LayoutItem],
        columns: usize,
    ) -> Result<Vec<ColumnAssignment>> {
        self.backend.distribute_columns(items, columns)
    }

    pub fn analyze_consensus(&self, votes: &[Vote]) -> Result<ConsensusResult> {
        self.backend.analyze_consensus(&[], votes)
    }

    pub fn analyze_consensus_with_statements(
        &self,
        statements: &[Statement],
        votes: &[Vote],
    ) -> Result<ConsensusResult> {
        self.backend.analyze_consensus(statements, votes)
    }

    pub fn score_votes(&self, counts: &[VoteCount]) -> Vec<VoteSummary> {
        ranking::score_votes(counts)
    }

    pub fn rank_threads(&self, threads: Vec<ForumThread>, now: &DateTime<Utc>) -> Vec<ForumThread> {
        ranking::rank_threads(threads, now)
    }

    pub fn execute(&self, request: EngineRequest) -> Result<EngineResponse> {
        debug!(op = request.op(), backend = %self.backend_kind(), "Executing request");

        let response = match request {
            EngineRequest::Rank {
                posts,
                strategy,
                now,
            } => EngineResponse::Posts(self.rank(posts, strategy, &now.resolve()?)),
            EngineRequest::Remix { slices, limit } => {
                EngineResponse::Remix(self.remix(&slices, limit)?)
            }
            EngineRequest::DistributeColumns { items, columns } => {
                EngineResponse::Columns(self.distribute_columns(&items, columns)?)
            }
            EngineRequest::AnalyzeConsensus { votes, statements } => EngineResponse::Consensus(
                self.analyze_consensus_with_statements(&statements, &votes)?,
            ),
            EngineRequest::ScoreVotes { counts } => {
                EngineResponse::VoteSummaries(self.score_votes(&counts))
            }
            EngineRequest::RankThreads { threads, now } => {
                EngineResponse::Threads(self.rank_threads(threads, &now.resolve()?))
            }
        };

        Ok(response)
    }

    /// Parse a JSON request, run it, and return the JSON result.
    pub fn dispatch_json(&self, request: &str) -> Result<String> {
        let response = self.execute(EngineRequest::parse(request)?)?;
        Ok(serde_json::to_string(&response)?)
    }
}

pub struct EngineFacade {
    config: EngineConfig,
    loader: Arc<dyn BackendLoader>,
    handle: OnceCell<EngineHandle>,
}

impl EngineFacade {
    pub fn new(config: EngineConfig) -> Self {
        let loader = Arc::new(VectorizedLoader::new(config.clone()));
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: EngineConfig, loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            config,
            loader,
            handle: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the engine, initializing it on first use.
    pub async fn handle(&self) -> &EngineHandle {
        self.handle.get_or_init(|| self.initialize()).await
    }

    /// The resolved engine, if initialization has already finished.
    pub fn try_handle(&self) -> Option<&EngineHandle> {
        self.handle.get()
    }

    async fn initialize(&self) -> EngineHandle {
        if !self.config.acceleration {
            info!(backend = %BackendKind::Reference, "Acceleration disabled by configuration");
            return EngineHandle::reference(&self.config);
        }

        let attempts = self.config.init_retries + 1;
        for attempt in 1..=attempts {
            match self.loader.load().await {
                Ok(backend) => {
                    info!(
                        backend = %backend.kind(),
                        attempt = attempt,
                        "Engine backend initialized"
                    );
                    return EngineHandle::new(backend);
                }
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        attempts = attempts,
                        error = %e,
                        "Accelerated backend initialization failed"
                    );
                    if attempt < attempts {
                        let backoff = self.config.init_backoff_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        warn!(
            backend = %BackendKind::Reference,
            "Falling back to reference backend for the rest of the process lifetime"
        );
        EngineHandle::reference(&self.config)
    }

    pub async fn rank(
        &self,
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Vec<RankablePost> {
        self.handle().await.rank(posts, strategy, now)
    }

    pub async fn remix(&self, slices: &[FeedSlice], limit: usize) -> Result<RemixResult> {
        self.handle().await.remix(slices, limit)
    }

    pub async fn distribute_columns(
        &self,
        items: &[LayoutItem],
        columns: usize,
    ) -> Result<Vec<ColumnAssignment>> {
        self.handle().await.distribute_columns(items, columns)
    }

    pub async fn analyze_consensus(&self, votes: &[Vote]) -> Result<ConsensusResult> {
        self.handle().await.analyze_consensus(votes)
    }

    pub async fn score_votes(&self, counts: &[VoteCount]) -> Vec<VoteSummary> {
        self.handle().await.score_votes(counts)
    }

    pub async fn rank_threads(
        &self,
        threads: Vec<ForumThread>,
        now: &DateTime<Utc>,
    ) -> Vec<ForumThread> {
        self.handle().await.rank_threads(threads, now)
    }

    pub async fn dispatch_json(&self, request: &str) -> Result<String> {
        self.handle().await.dispatch_json(request)
    }
}

#[cfg(test)]
mod tests {
    use super::loader::MockBackendLoader;
    use super::*;
    use crate::error::EngineError;
    use crate::services::backend::VectorizedBackend;

    fn fast_config(retries: u32) -> EngineConfig {
        EngineConfig {
            init_retries: retries,
            init_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_falls_back_after_retries() {
        let mut loader = MockBackendLoader::new();
        loader
            .expect_load()
            .times(3)
            .returning(|| Err(EngineError::BackendInit("no accelerator".to_string())));

        let facade = EngineFacade::with_loader(fast_config(2), Arc::new(loader));

        assert_eq!(facade.handle().await.backend_kind(), BackendKind::Reference);
        // Resolved once; later calls never touch the loader again
        assert_eq!(facade.handle().await.backend_kind(), BackendKind::Reference);
        assert!(facade.try_handle().is_some());
    }

    #[tokio::test]
    async fn test_successful_load_is_used() {
        let mut loader = MockBackendLoader::new();
        loader.expect_load().times(1).returning(|| {
            let backend = VectorizedBackend::new(Default::default(), 1e-9)?;
            Ok(Arc::new(backend) as Arc<dyn RankingBackend>)
        });

        let facade = EngineFacade::with_loader(fast_config(0), Arc::new(loader));

        assert_eq!(facade.handle().await.backend_kind(), BackendKind::Vectorized);
    }

    #[tokio::test]
    async fn test_acceleration_disabled_skips_loader() {
        let mut loader = MockBackendLoader::new();
        loader.expect_load().times(0);

        let facade = EngineFacade::with_loader(EngineConfig::reference_only(), Arc::new(loader));

        assert_eq!(facade.handle().await.backend_kind(), BackendKind::Reference);
    }

    #[test]
    fn test_try_handle_before_init() {
        let facade = EngineFacade::new(EngineConfig::reference_only());
        assert!(facade.try_handle().is_none());

        let handle = tokio_test::block_on(facade.handle());
        assert_eq!(handle.backend_kind(), BackendKind::Reference);
    }

    #[test]
    fn test_dispatch_json_reports_caller_errors() {
        let handle = EngineHandle::reference(&EngineConfig::default());

        let err = handle
            .dispatch_json(r#"{"op":"distributeColumns","items":[],"columns":0}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = handle.dispatch_json("not json").unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_dispatch_json_score_votes() {
        let handle = EngineHandle::reference(&EngineConfig::default());

        let out = handle
            .dispatch_json(r#"{"op":"scoreVotes","counts":[{"uri":"a","likes":3,"downvotes":1}]}"#)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["netScore"], 2);
        assert_eq!(value[0]["totalVotes"], 4);
        assert_eq!(value[0]["likeRatio"], 0.75);
    }
}
