use std::path::Path;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Identity, Response};

use crate::config::ConnectionOpts;
use crate::domain::model::{self, PodSelector};
use crate::domain::ports::ClusterPods;
use crate::utils::error::{DwvError, Result};

/// Which DataWave web service a request targets. Each service is exposed
/// under its own DNS name and runs in its own pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Datawave,
    Dictionary,
    Authorization,
}

impl Service {
    pub fn dns_prefix(&self) -> &'static str {
        match self {
            Service::Datawave => "datawave",
            Service::Dictionary => "dwv-dictionary",
            Service::Authorization => "dwv-authorization",
        }
    }

    pub fn pod_selector(&self) -> PodSelector {
        match self {
            Service::Datawave => model::WEB_DATAWAVE,
            Service::Dictionary => model::WEB_DICTIONARY,
            Service::Authorization => model::WEB_AUTHORIZATION,
        }
    }
}

/// Load the client certificate used to authenticate against DataWave. When a
/// separate key file is given its PEM blocks are appended to the
/// certificate's, since reqwest expects a single combined identity.
pub fn load_identity(cert: &Path, key: Option<&Path>) -> Result<Identity> {
    let mut pem = std::fs::read(cert)?;
    if let Some(key) = key {
        pem.push(b'\n');
        pem.extend(std::fs::read(key)?);
    }
    Ok(Identity::from_pem(&pem)?)
}

/// Build the HTTPS client shared by all requests of one invocation. Server
/// certificate verification is disabled: the deployments this tool targets
/// sit behind self-signed certificates.
pub fn build_client(identity: Option<Identity>, headers: &[(String, String)]) -> Result<Client> {
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| DwvError::ConfigError {
            message: format!("invalid header name `{}`: {}", name, e),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| DwvError::ConfigError {
            message: format!("invalid header value for `{}`: {}", name, e),
        })?;
        header_map.insert(name, value);
    }

    let mut builder = Client::builder()
        .danger_accept_invalid_certs(true)
        .default_headers(header_map);
    if let Some(identity) = identity {
        builder = builder.identity(identity);
    }
    Ok(builder.build()?)
}

/// Resolve the base URL for a service from the connection options, looking
/// the pod IP up in the cluster when `--ip` was passed.
pub async fn resolve_base_url_with(
    service: Service,
    opts: &ConnectionOpts,
    pods: &dyn ClusterPods,
) -> Result<String> {
    if opts.localhost {
        return Ok("https://localhost:8443".to_string());
    }
    if opts.ip {
        let addr = pods.lookup(service.pod_selector(), &opts.namespace).await?;
        tracing::debug!("resolved {} to pod {} ({})", service.dns_prefix(), addr.name, addr.ip);
        return Ok(format!("https://{}:8443", addr.ip));
    }
    match opts.url.as_deref() {
        Some(url) if !url.is_empty() => Ok(format!("https://{}.{}", service.dns_prefix(), url)),
        _ => Err(DwvError::ConfigError {
            message: "URL is none, cannot continue. Pass --url or set DWV_URL.".to_string(),
        }),
    }
}

/// Convenience wrapper that connects to the cluster only when the options
/// actually require a pod lookup.
pub async fn resolve_base_url(service: Service, opts: &ConnectionOpts) -> Result<String> {
    if opts.ip && !opts.localhost {
        let pods = super::kubernetes::KubePods::connect().await?;
        resolve_base_url_with(service, opts, &pods).await
    } else {
        resolve_base_url_with(service, opts, &NoCluster).await
    }
}

struct NoCluster;

#[async_trait::async_trait]
impl ClusterPods for NoCluster {
    async fn lookup(&self, selector: PodSelector, namespace: &str) -> Result<model::PodAddress> {
        Err(DwvError::PodNotFound {
            labels: selector.labels.to_string(),
            namespace: namespace.to_string(),
        })
    }

    async fn exec(&self, _: PodSelector, _: &str, _: &str) -> Result<String> {
        Err(DwvError::ConfigError {
            message: "no cluster connection".to_string(),
        })
    }
}

/// Trace a response status and hand the response back when it is a success.
/// Failures have their body drained into the debug log before the error is
/// propagated.
pub async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    tracing::debug!(
        "Response Status: {}, {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    match resp.error_for_status_ref() {
        Ok(_) => Ok(resp),
        Err(err) => {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("Response Content: {}", body);
            Err(DwvError::ApiError(err))
        }
    }
}
