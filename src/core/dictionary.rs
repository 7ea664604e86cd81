use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED;
use comfy_table::Table;
use reqwest::Client;

use crate::adapters::http::ensure_success;
use crate::domain::model::{DictionaryResponse, MetadataField};
use crate::utils::error::{DwvError, Result};

const DICTIONARY_COLUMNS: [&str; 10] = [
    "name",
    "Data Type",
    "Forward Indexed",
    "Reversed Indexed",
    "Types",
    "Tokenized",
    "Normalized",
    "Index Only",
    "Descriptions",
    "Last Updated",
];

/// Fetch the field dictionary, optionally restricted to a comma-separated
/// list of data types.
pub async fn fetch_dictionary(
    client: &Client,
    base_url: &str,
    auths: &str,
    data_types: Option<&str>,
) -> Result<Vec<MetadataField>> {
    tracing::info!("Getting the entire field dictionary in DataWave...");
    let url = format!("{}/dictionary/data/v1/", base_url);
    tracing::debug!("{}", url);

    let mut form = vec![("auths", auths.to_string())];
    if let Some(data_types) = data_types {
        form.push(("dataTypeFilters", data_types.to_string()));
    }

    let resp = client.get(&url).form(&form).send().await?;
    let resp = ensure_success(resp).await?;
    let body: serde_json::Value = resp.json().await?;
    let parsed: DictionaryResponse =
        serde_json::from_value(body).map_err(|source| DwvError::MalformedResponse {
            context: "dictionary",
            source,
        })?;
    Ok(parsed.fields)
}

pub fn render_table(fields: &[MetadataField]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);
    table.set_header(DICTIONARY_COLUMNS);
    for field in fields {
        table.add_row(vec![
            field.field_name.clone(),
            field.data_type.clone(),
            field.forward_indexed.to_string(),
            field.reverse_indexed.to_string(),
            format_types(field.types.as_deref()),
            field.tokenized.to_string(),
            field.normalized.to_string(),
            field.index_only.to_string(),
            format_descriptions(field.descriptions.as_ref()),
            field.last_updated.clone(),
        ]);
    }
    table.to_string()
}

fn format_types(types: Option<&[String]>) -> String {
    types.map(|t| t.join(", ")).unwrap_or_default()
}

fn format_descriptions(descriptions: Option<&serde_json::Value>) -> String {
    match descriptions {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn display_dictionary(fields: &[MetadataField]) {
    if fields.is_empty() {
        tracing::warn!("No fields to display.");
        return;
    }
    println!("{}", render_table(fields));
}

/// Append the rendered dictionary to a file.
pub fn save_dictionary(path: &Path, fields: &[MetadataField]) -> Result<()> {
    if fields.is_empty() {
        tracing::warn!("No fields to display.");
        return Ok(());
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", render_table(fields))?;
    tracing::info!("Saved dictionary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_field() -> MetadataField {
        serde_json::from_value(serde_json::json!({
            "fieldName": "GENRES",
            "dataType": "music",
            "forwardIndexed": true,
            "reverseIndexed": false,
            "Types": ["LcNoDiacriticsType", "TextType"],
            "tokenized": true,
            "normalized": false,
            "indexOnly": false,
            "Descriptions": null,
            "lastUpdated": "20240101"
        }))
        .unwrap()
    }

    #[test]
    fn test_render_table_contains_header_and_values() {
        let rendered = render_table(&[sample_field()]);

        assert!(rendered.contains("name"));
        assert!(rendered.contains("Data Type"));
        assert!(rendered.contains("GENRES"));
        assert!(rendered.contains("music"));
        assert!(rendered.contains("LcNoDiacriticsType, TextType"));
    }

    #[test]
    fn test_save_dictionary_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.txt");

        save_dictionary(&path, &[sample_field()]).unwrap();
        save_dictionary(&path, &[sample_field()]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("GENRES").count(), 2);
    }

    #[test]
    fn test_save_dictionary_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.txt");

        save_dictionary(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_format_descriptions_variants() {
        assert_eq!(format_descriptions(None), "");
        assert_eq!(
            format_descriptions(Some(&serde_json::Value::String("plain".to_string()))),
            "plain"
        );
        assert_eq!(
            format_descriptions(Some(&serde_json::json!([{"description": "d"}]))),
            r#"[{"description":"d"}]"#
        );
    }
}
