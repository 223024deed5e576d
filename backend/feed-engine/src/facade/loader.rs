use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::services::backend::{RankingBackend, VectorizedBackend};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Produces the accelerated backend. Called at most `init_retries + 1`
/// times per facade, never per operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn RankingBackend>>;
}

/// Builds a [`VectorizedBackend`] (including its self-check) on the blocking pool.
pub struct VectorizedLoader {
    config: EngineConfig,
}

impl VectorizedLoader {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendLoader for VectorizedLoader {
    async fn load(&self) -> Result<Arc<dyn RankingBackend>> {
        let clustering = self.config.clustering();
        let epsilon = self.config.self_check_epsilon;

        debug!("Building vectorized backend");

        let backend = tokio::task::spawn_blocking(move || VectorizedBackend::new(clustering, epsilon))
            .await
            .map_err(|e| EngineError::BackendInit(format!("init task failed: {e}")))??;

        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::BackendKind;

    #[tokio::test]
    async fn test_vectorized_loader_builds_backend() {
        let loader = VectorizedLoader::new(EngineConfig::default());
        let backend = loader.load().await.unwrap();
        assert_eq!(backend.kind(), BackendKind::Vectorized);
    }
}
