//! Seed corpus for end-to-end tests

use super::constants::*;
use anyhow::Result;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

/// Writes the seed documents to a temporary JSON file.
/// The file is removed when the returned handle is dropped.
pub fn create_seed_file() -> Result<NamedTempFile> {
    let documents = json!([
        {
            "id": DOC_A1_ID,
            "collection": COLLECTION_A,
            "title": "Getting started",
            "section": "Introduction",
            "content": "Install the service, then run a first search against the sample collection."
        },
        {
            "id": DOC_A2_ID,
            "collection": COLLECTION_A,
            "title": "Search configuration",
            "content": "Tune the default limit and the relevance threshold used by every search."
        },
        {
            "id": DOC_B1_ID,
            "collection": COLLECTION_B,
            "title": "Search API reference",
            "doc_type": "reference",
            "path": "api/search.md",
            "content": "The search endpoint accepts a query, an optional collection filter and a limit."
        },
        {
            "id": DOC_B2_ID,
            "collection": COLLECTION_B,
            "title": "Deployment",
            "content": "Run the binary behind a reverse proxy and expose the metrics port internally."
        }
    ]);

    let mut file = NamedTempFile::new()?;
    file.write_all(serde_json::to_string_pretty(&documents)?.as_bytes())?;
    file.flush()?;
    Ok(file)
}
