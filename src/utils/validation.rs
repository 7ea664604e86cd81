use std::path::Path;

use url::Url;

use crate::utils::error::{DwvError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DwvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DwvError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DwvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Checks that a path exists and carries the expected extension.
pub fn validate_file(field_name: &str, path: &Path, extension: &str) -> Result<()> {
    if !path.exists() {
        return Err(DwvError::FileNotFoundError(path.to_path_buf()));
    }
    if path.extension().and_then(|e| e.to_str()) != Some(extension) {
        return Err(DwvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: format!("expected a .{} file", extension),
        });
    }
    Ok(())
}

/// Checks only the extension, for output paths that do not exist yet.
pub fn validate_file_type(field_name: &str, path: &Path, extension: &str) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(extension) {
        return Err(DwvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: format!("expected a .{} file", extension),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DwvError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
