use async_trait::async_trait;

use crate::domain::model::{PodAddress, PodSelector};
use crate::utils::error::Result;

/// Access to the Kubernetes cluster hosting the DataWave deployment. The
/// ingest interactions and `--ip` base-url resolution go through this seam so
/// they can be exercised against a fake cluster in tests.
#[async_trait]
pub trait ClusterPods: Send + Sync {
    /// Resolve the first pod matching `selector` in `namespace`.
    async fn lookup(&self, selector: PodSelector, namespace: &str) -> Result<PodAddress>;

    /// Run a shell command inside the pod matching `selector` and return its
    /// stdout.
    async fn exec(&self, selector: PodSelector, namespace: &str, command: &str) -> Result<String>;
}
