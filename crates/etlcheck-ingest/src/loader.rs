use async_trait::async_trait;

use etlcheck_core::Dataset;

use crate::errors::LoadResult;

/// Trait implemented by anything that can materialize a dataset.
#[async_trait]
pub trait DatasetLoader {
    /// Short label used in logs (e.g. `csv`, `postgres`).
    fn kind(&self) -> &'static str;

    /// Human-readable origin, safe to log.
    fn describe(&self) -> String;

    async fn load(&self) -> LoadResult<Dataset>;
}
