use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;

use datawave_cli::adapters::http::build_client;
use datawave_cli::core::dictionary::{fetch_dictionary, render_table};
use datawave_cli::DwvError;

fn dictionary_body() -> serde_json::Value {
    json!({
        "MetadataFields": [
            {
                "fieldName": "GENRES",
                "dataType": "music",
                "forwardIndexed": true,
                "reverseIndexed": false,
                "Types": ["LcNoDiacriticsType"],
                "tokenized": false,
                "normalized": true,
                "indexOnly": false,
                "Descriptions": [],
                "lastUpdated": "20240101"
            },
            {
                "fieldName": "ARTIST",
                "dataType": "music",
                "forwardIndexed": true,
                "reverseIndexed": true,
                "Types": null,
                "tokenized": true,
                "normalized": true,
                "indexOnly": false,
                "Descriptions": [{"description": "performer name"}],
                "lastUpdated": "20240215"
            }
        ]
    })
}

#[tokio::test]
async fn test_fetch_dictionary() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/dictionary/data/v1/")
            .body_contains("auths=BAR%2CFOO")
            .body_contains("dataTypeFilters=music");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(dictionary_body());
    });

    let client = build_client(None, &[])?;
    let fields = fetch_dictionary(&client, &server.base_url(), "BAR,FOO", Some("music")).await?;

    mock.assert();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].field_name, "GENRES");
    assert!(fields[1].reverse_indexed);

    let rendered = render_table(&fields);
    assert!(rendered.contains("GENRES"));
    assert!(rendered.contains("ARTIST"));
    assert!(rendered.contains("Last Updated"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_dictionary_omits_absent_data_type_filter() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dictionary/data/v1/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"MetadataFields": []}));
    });

    let client = build_client(None, &[])?;
    let fields = fetch_dictionary(&client, &server.base_url(), "BAR", None).await?;

    mock.assert();
    assert!(fields.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fetch_dictionary_malformed_response() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/dictionary/data/v1/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"SomethingElse": []}));
    });

    let client = build_client(None, &[])?;
    let result = fetch_dictionary(&client, &server.base_url(), "BAR", None).await;

    assert!(matches!(
        result,
        Err(DwvError::MalformedResponse { context: "dictionary", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_fetch_dictionary_http_failure() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/dictionary/data/v1/");
        then.status(403);
    });

    let client = build_client(None, &[])?;
    let result = fetch_dictionary(&client, &server.base_url(), "BAR", None).await;

    assert!(matches!(result, Err(DwvError::ApiError(_))));
    Ok(())
}
