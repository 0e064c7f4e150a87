//! Serialization of the assembled document to YAML or JSON.

use crate::openapi::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serialize an OpenAPI document to YAML.
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("serializing document to YAML");
    serde_yaml::to_string(doc).context("failed to serialize document to YAML")
}

/// Serialize an OpenAPI document to pretty-printed JSON.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("serializing document to JSON");
    serde_json::to_string_pretty(doc).context("failed to serialize document to JSON")
}

/// Write string content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("writing output to {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;

    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
