use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::core::results::{filter_events, parse_events};
use crate::domain::model::FlatRecord;
use crate::utils::error::{DwvError, Result};

const CREATE_ENDPOINT: &str = "DataWave/Query/EventQuery/create.json";

/// Form parameters for creating an EventQuery.
#[derive(Debug, Clone, Serialize)]
pub struct QueryParams {
    #[serde(rename = "queryName")]
    pub query_name: String,
    #[serde(rename = "columnVisibility")]
    pub column_visibility: String,
    #[serde(rename = "pagesize")]
    pub page_size: u32,
    pub begin: String,
    pub end: String,
    pub query: String,
    pub auths: String,
    #[serde(rename = "query.syntax")]
    pub syntax: String,
}

impl QueryParams {
    pub fn new(query_name: &str, query: &str, auths: &str) -> Self {
        Self {
            query_name: query_name.to_string(),
            column_visibility: "N/A".to_string(),
            page_size: 5,
            begin: "19700101".to_string(),
            end: "20990101".to_string(),
            query: query.to_string(),
            auths: auths.to_string(),
            syntax: "JEXL".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "Result")]
    result: String,
}

/// A server-side query lifecycle: `create.json` opens it, repeated
/// `next.json` calls page through results, `close.json` releases it.
pub struct QueryConnection<'a> {
    client: &'a Client,
    base_url: String,
    params: QueryParams,
    query_id: Option<String>,
    results_count: u64,
}

impl<'a> QueryConnection<'a> {
    pub fn new(client: &'a Client, base_url: impl Into<String>, params: QueryParams) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            params,
            query_id: None,
            results_count: 0,
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Events returned so far, accumulated from each page's `ReturnedEvents`.
    pub fn results_count(&self) -> u64 {
        self.results_count
    }

    fn next_endpoint(&self) -> Result<String> {
        match &self.query_id {
            Some(id) => Ok(format!("DataWave/Query/{}/next.json", id)),
            None => Err(DwvError::QueryError {
                message: "Query UUID not set, cannot create the next endpoint.".to_string(),
            }),
        }
    }

    fn close_endpoint(&self) -> Result<String> {
        match &self.query_id {
            Some(id) => Ok(format!("DataWave/Query/{}/close.json", id)),
            None => Err(DwvError::QueryError {
                message: "Query UUID not set, cannot create the close endpoint.".to_string(),
            }),
        }
    }

    /// Create the query on the server. Any non-200 reply is fatal.
    pub async fn open(&mut self) -> Result<()> {
        let url = format!("{}/{}", self.base_url, CREATE_ENDPOINT);
        tracing::debug!("{}", url);
        tracing::info!("Executing with {:?}", self.params);

        let resp = self.client.post(&url).form(&self.params).send().await?;
        let status = resp.status();
        tracing::debug!(
            "Response Status: {}, {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("Request failed - (Status Code:{})", status.as_u16());
            tracing::error!("Response Content: {}", body);
            return Err(DwvError::QueryError {
                message: format!(
                    "Create endpoint came back with non-200 response. {}",
                    status.as_u16()
                ),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let created: CreateResponse =
            serde_json::from_value(body).map_err(|source| DwvError::MalformedResponse {
                context: "create",
                source,
            })?;
        self.query_id = Some(created.result);
        Ok(())
    }

    /// Fetch the next page of raw results, or `None` once the server reports
    /// the query exhausted (any non-200 reply, typically 204).
    pub async fn next_page(&mut self) -> Result<Option<serde_json::Value>> {
        let url = format!("{}/{}", self.base_url, self.next_endpoint()?);
        tracing::debug!("{}", url);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        tracing::debug!(
            "Response Status: {}, {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        if status != StatusCode::OK {
            return Ok(None);
        }

        let page: serde_json::Value = resp.json().await?;
        if let Some(count) = page.get("ReturnedEvents").and_then(|v| v.as_u64()) {
            self.results_count += count;
        }
        Ok(Some(page))
    }

    /// Release the server-side query. Best effort: a failed close is logged,
    /// never propagated.
    pub async fn close(&mut self) {
        match self.close_endpoint() {
            Ok(endpoint) => {
                let url = format!("{}/{}", self.base_url, endpoint);
                tracing::debug!("{}", url);
                if let Err(e) = self.client.get(&url).send().await {
                    tracing::warn!("failed to close query: {}", e);
                }
            }
            Err(e) => tracing::debug!("{}", e),
        }
        if self.results_count > 0 {
            tracing::info!("Total results retrieved: {}", self.results_count);
        } else {
            tracing::info!("No results found!");
        }
        self.query_id = None;
    }
}

/// Query-level metadata stored alongside saved results.
#[derive(Debug, Serialize)]
pub struct QueryMetadata {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Returned Events")]
    pub returned_events: u64,
    #[serde(rename = "Auths")]
    pub auths: String,
    #[serde(rename = "Cert")]
    pub cert: String,
    #[serde(rename = "Unix Timestamp(ms)")]
    pub timestamp_ms: i64,
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub metadata: QueryMetadata,
    pub events: Vec<FlatRecord>,
}

/// Run a query end to end: create it, drain every page, close it, then
/// flatten and (optionally) filter the collected events.
///
/// Filtering happens over the full result set rather than page by page, so a
/// field that only shows up in a later page still counts as present.
pub async fn run_query(
    client: &Client,
    base_url: &str,
    params: QueryParams,
    filter_on: Option<&str>,
    cert_stem: &str,
) -> Result<QueryOutcome> {
    let mut conn = QueryConnection::new(client, base_url, params);
    conn.open().await?;

    let collected = drain_pages(&mut conn).await;
    conn.close().await;

    let events = filter_events(collected?, filter_on)?;
    let metadata = QueryMetadata {
        query: conn.params().query.clone(),
        returned_events: conn.results_count(),
        auths: conn.params().auths.clone(),
        cert: cert_stem.to_string(),
        timestamp_ms: Utc::now().timestamp_millis(),
    };
    Ok(QueryOutcome { metadata, events })
}

async fn drain_pages(conn: &mut QueryConnection<'_>) -> Result<Vec<FlatRecord>> {
    let mut events = Vec::new();
    while let Some(page) = conn.next_page().await? {
        events.extend(parse_events(page)?);
    }
    Ok(events)
}

/// Print the events to the console, one `name: value` line per field. Raw
/// parquet blobs are never dumped to the terminal.
pub fn print_query(outcome: &QueryOutcome) {
    for event in &outcome.events {
        for (name, value) in event {
            if name.contains("RAWDATA") {
                println!("{}: Contains raw data", name);
            } else {
                println!("{}: {}", name, value);
            }
        }
        println!("{}", "-".repeat(10));
    }
    println!("Query returned: {} events.", outcome.metadata.returned_events);
}

/// Save results and metadata as JSON. An existing file at the target path is
/// renamed to `<stem>_old` first. With `decode_raw`, base64 parquet blobs are
/// additionally written out under `rawdata/` next to the output file.
pub fn save_query(outcome: &QueryOutcome, path: &Path, decode_raw: bool) -> Result<()> {
    println!("Outputting to {}", path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if path.exists() {
        println!("Existing output file exists. Attempting to rename it.");
        let renamed = sibling_with_old_stem(path);
        fs::rename(path, &renamed).map_err(|e| {
            tracing::error!("Failed to rename old file! Check that it is not in use or otherwise locked!");
            DwvError::IoError(e)
        })?;
        println!("Existing file renamed to {}", renamed.display());
    }

    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(
        file,
        &serde_json::json!({"metadata": &outcome.metadata, "events": &outcome.events}),
    )?;
    tracing::info!("Saved output file to {}", path.display());

    if decode_raw {
        write_raw_blobs(outcome, path)?;
        tracing::info!(
            "Saved raw data to {}/rawdata",
            path.parent().unwrap_or_else(|| Path::new(".")).display()
        );
    }
    Ok(())
}

fn sibling_with_old_stem(path: &Path) -> std::path::PathBuf {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => path.with_file_name(format!("{}_old.{}", stem, ext)),
        None => path.with_file_name(format!("{}_old", stem)),
    }
}

fn write_raw_blobs(outcome: &QueryOutcome, path: &Path) -> Result<()> {
    let base = path.parent().unwrap_or_else(|| Path::new(".")).join("rawdata");

    for event in &outcome.events {
        let orig_file = event.get("ORIG_FILE").map(|v| v.first().to_string());
        for (key, value) in event {
            if !key.contains("RAWDATA") {
                continue;
            }
            let Some(orig_file) = orig_file.as_deref() else {
                tracing::warn!("event has {} but no ORIG_FILE, skipping blob", key);
                continue;
            };
            let bytes = BASE64
                .decode(value.first())
                .map_err(|e| DwvError::QueryError {
                    message: format!("failed to decode raw data in {}: {}", key, e),
                })?;

            let dir = orig_file.split(".json").next().unwrap_or(orig_file);
            let name = key.splitn(2, '_').nth(1).unwrap_or(key);
            let target = base.join(dir).join(format!("{}.parquet", name));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldValue;
    use serde_json::json;

    fn outcome(events: Vec<FlatRecord>) -> QueryOutcome {
        QueryOutcome {
            metadata: QueryMetadata {
                query: "GENRES == 'Test'".to_string(),
                returned_events: events.len() as u64,
                auths: "BAR,FOO".to_string(),
                cert: "test-cert".to_string(),
                timestamp_ms: 1_700_000_000_000,
            },
            events,
        }
    }

    #[test]
    fn test_query_params_defaults() {
        let params = QueryParams::new("test-query", "FIELD == 'x'", "A,B");

        assert_eq!(params.column_visibility, "N/A");
        assert_eq!(params.page_size, 5);
        assert_eq!(params.begin, "19700101");
        assert_eq!(params.end, "20990101");

        let form = serde_json::to_value(&params).unwrap();
        assert_eq!(
            form,
            json!({
                "queryName": "test-query",
                "columnVisibility": "N/A",
                "pagesize": 5,
                "begin": "19700101",
                "end": "20990101",
                "query": "FIELD == 'x'",
                "auths": "A,B",
                "query.syntax": "JEXL"
            })
        );
    }

    #[tokio::test]
    async fn test_next_page_without_open_fails() {
        let client = Client::new();
        let mut conn = QueryConnection::new(
            &client,
            "https://testserver",
            QueryParams::new("q", "x == 'y'", "A"),
        );

        let err = conn.next_page().await;
        assert!(matches!(err, Err(DwvError::QueryError { .. })));
    }

    #[test]
    fn test_sibling_with_old_stem_keeps_extension() {
        assert_eq!(
            sibling_with_old_stem(Path::new("/tmp/out/results.json")),
            Path::new("/tmp/out/results_old.json")
        );
        assert_eq!(
            sibling_with_old_stem(Path::new("results")),
            Path::new("results_old")
        );
    }

    #[test]
    fn test_save_query_writes_metadata_and_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut record = FlatRecord::new();
        record.insert("field1".to_string(), FieldValue::from("value1"));
        save_query(&outcome(vec![record]), &path, false).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["metadata"]["Query"], "GENRES == 'Test'");
        assert_eq!(saved["metadata"]["Returned Events"], 1);
        assert_eq!(saved["events"][0]["field1"], "value1");
    }

    #[test]
    fn test_save_query_renames_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "old contents").unwrap();

        save_query(&outcome(vec![]), &path, false).unwrap();

        let renamed = dir.path().join("results_old.json");
        assert_eq!(fs::read_to_string(renamed).unwrap(), "old contents");
        assert!(path.exists());
    }

    #[test]
    fn test_save_query_decodes_raw_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut record = FlatRecord::new();
        record.insert(
            "RAWDATA_field".to_string(),
            FieldValue::Single(BASE64.encode(b"fake_binary_data")),
        );
        record.insert("ORIG_FILE".to_string(), FieldValue::from("source.json"));

        save_query(&outcome(vec![record]), &path, true).unwrap();

        let blob = dir.path().join("rawdata").join("source").join("field.parquet");
        assert_eq!(fs::read(blob).unwrap(), b"fake_binary_data");
    }
}
