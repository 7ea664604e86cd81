use reqwest::Client;

use crate::adapters::http::ensure_success;
use crate::utils::error::Result;

/// Ask DataWave to reload its Accumulo metadata table cache.
pub async fn reload_cache(client: &Client, base_url: &str) -> Result<()> {
    tracing::info!("Reloading the accumulo cache...");
    let url = format!(
        "{}/DataWave/Common/AccumuloTableCache/reload/datawave.metadata",
        base_url
    );
    tracing::debug!("{}", url);

    let resp = client.get(&url).send().await?;
    ensure_success(resp).await?;
    tracing::info!("Successfully requested a reload.");
    Ok(())
}

/// Fetch the current Accumulo table cache status as reported by DataWave.
pub async fn view_cache(client: &Client, base_url: &str) -> Result<String> {
    tracing::info!("Viewing the accumulo cache...");
    let url = format!("{}/DataWave/Common/AccumuloTableCache/", base_url);
    tracing::debug!("{}", url);

    let resp = client.get(&url).send().await?;
    let resp = ensure_success(resp).await?;
    Ok(resp.text().await?)
}
