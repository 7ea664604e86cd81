use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;

use datawave_cli::adapters::http::build_client;
use datawave_cli::core::{accumulo, authorization};
use datawave_cli::DwvError;

#[tokio::test]
async fn test_accumulo_reload() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/DataWave/Common/AccumuloTableCache/reload/datawave.metadata");
        then.status(200);
    });

    let client = build_client(None, &[])?;
    accumulo::reload_cache(&client, &server.base_url()).await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_accumulo_view_returns_body() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/DataWave/Common/AccumuloTableCache/");
        then.status(200).body("<cache>datawave.metadata</cache>");
    });

    let client = build_client(None, &[])?;
    let status = accumulo::view_cache(&client, &server.base_url()).await?;

    mock.assert();
    assert_eq!(status, "<cache>datawave.metadata</cache>");
    Ok(())
}

#[tokio::test]
async fn test_accumulo_reload_failure_propagates() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET)
            .path("/DataWave/Common/AccumuloTableCache/reload/datawave.metadata");
        then.status(500);
    });

    let client = build_client(None, &[])?;
    let result = accumulo::reload_cache(&client, &server.base_url()).await;

    assert!(matches!(result, Err(DwvError::ApiError(_))));
    Ok(())
}

#[tokio::test]
async fn test_whoami_pretty_prints_json() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/authorization/v1/whoami");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"dn": "cn=test user", "auths": ["BAR", "FOO"]}));
    });

    let client = build_client(None, &[])?;
    let details = authorization::whoami(&client, &server.base_url()).await?;

    mock.assert();
    // Pretty-printed: multi-line with indentation.
    assert!(details.contains("\n"));
    assert!(details.contains("\"cn=test user\""));
    Ok(())
}

#[tokio::test]
async fn test_whoami_passes_non_json_through() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/authorization/v1/whoami");
        then.status(200).body("plain text reply");
    });

    let client = build_client(None, &[])?;
    let details = authorization::whoami(&client, &server.base_url()).await?;

    assert_eq!(details, "plain text reply");
    Ok(())
}
