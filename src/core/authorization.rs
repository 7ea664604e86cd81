use reqwest::Client;

use crate::adapters::http::ensure_success;
use crate::utils::error::Result;

/// Call the authorization service's `whoami` endpoint and return the body,
/// pretty-printed when it is JSON.
pub async fn whoami(client: &Client, base_url: &str) -> Result<String> {
    tracing::info!("Getting the authorization details for my cert from DW...");
    let url = format!("{}/authorization/v1/whoami", base_url);
    tracing::debug!("{}", url);

    let resp = client.get(&url).send().await?;
    let resp = ensure_success(resp).await?;
    let text = resp.text().await?;

    Ok(match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(body) => serde_json::to_string_pretty(&body)?,
        Err(_) => text,
    })
}
