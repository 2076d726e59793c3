use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::pattern::types::PatternDocument;

/// Parse a pattern document from its JSON form.
/// Nesting depth is bounded by `RenderOptions::max_depth` at render time, not here.
pub fn load_document(json: &str) -> Result<PatternDocument> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();

    // deep trees recurse once per JSON level; grow the stack instead of overflowing it
    let document = PatternDocument::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .context("Failed to parse pattern document JSON")?;
    deserializer
        .end()
        .context("Failed to parse pattern document JSON")?;

    debug!(
        roots = document.patterns.len(),
        base_address = document.region.base_address,
        data_size = document.region.data_size,
        "loaded pattern document"
    );

    Ok(document)
}

/// Read and parse a pattern document from disk
pub fn load_document_from_path(path: &Path) -> Result<PatternDocument> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pattern document {}", path.display()))?;
    load_document(&json).with_context(|| format!("Invalid pattern document {}", path.display()))
}
