use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{AttachParams, ListParams};
use kube::{Api, Client};
use tokio::io::AsyncReadExt;

use crate::domain::model::{PodAddress, PodSelector};
use crate::domain::ports::ClusterPods;
use crate::utils::error::{DwvError, Result};

/// Cluster access backed by the local kubeconfig (or in-cluster config).
pub struct KubePods {
    client: Client,
}

impl KubePods {
    pub async fn connect() -> Result<Self> {
        Ok(Self {
            client: Client::try_default().await?,
        })
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterPods for KubePods {
    async fn lookup(&self, selector: PodSelector, namespace: &str) -> Result<PodAddress> {
        let params = ListParams::default().labels(selector.labels);
        let list = self.pods(namespace).list(&params).await?;
        let pod = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| DwvError::PodNotFound {
                labels: selector.labels.to_string(),
                namespace: namespace.to_string(),
            })?;

        let name = pod.metadata.name.unwrap_or_default();
        let ip = pod
            .status
            .and_then(|s| s.pod_ip)
            .ok_or_else(|| DwvError::ConfigError {
                message: format!("pod {} has no IP assigned yet", name),
            })?;
        Ok(PodAddress { name, ip })
    }

    async fn exec(&self, selector: PodSelector, namespace: &str, command: &str) -> Result<String> {
        let addr = self.lookup(selector, namespace).await?;
        tracing::debug!("exec in pod {}: {}", addr.name, command);

        let params = AttachParams::default().stdin(false).stdout(true).stderr(true);
        let mut attached = self
            .pods(namespace)
            .exec(&addr.name, ["/bin/sh", "-c", command], &params)
            .await?;

        let mut output = String::new();
        if let Some(mut stdout) = attached.stdout() {
            stdout.read_to_string(&mut output).await?;
        }
        attached
            .join()
            .await
            .map_err(|e| DwvError::KubeExecError(e.to_string()))?;
        Ok(output)
    }
}
