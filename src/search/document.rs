//! Indexed document model

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_COLLECTION: &str = "default";
pub const DEFAULT_DOC_TYPE: &str = "document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default)]
    pub path: Option<String>,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_doc_type() -> String {
    DEFAULT_DOC_TYPE.to_string()
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        collection: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            section: None,
            collection: collection.into(),
            doc_type: default_doc_type(),
            path: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// Document count for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub documents: usize,
}

/// Loads a JSON array of documents used to seed the backend at startup.
pub fn load_seed_documents(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {:?}", path))?;
    let documents: Vec<Document> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {:?}", path))?;
    if let Some(doc) = documents.iter().find(|d| d.id.trim().is_empty()) {
        anyhow::bail!("Seed document with empty id (title: {:?})", doc.title);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_document_defaults_on_deserialize() {
        let doc: Document =
            serde_json::from_value(serde_json::json!({"id": "a", "content": "text"})).unwrap();
        assert_eq!(doc.collection, DEFAULT_COLLECTION);
        assert_eq!(doc.doc_type, DEFAULT_DOC_TYPE);
        assert_eq!(doc.title, "");
        assert!(doc.section.is_none());
    }

    #[test]
    fn test_load_seed_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"1","title":"One","content":"first","collection":"docs-a"}},
               {{"id":"2","content":"second"}}]"#
        )
        .unwrap();

        let docs = load_seed_documents(file.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].collection, "docs-a");
        assert_eq!(docs[1].collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn test_load_seed_documents_rejects_empty_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id":"  ","content":"x"}}]"#).unwrap();
        assert!(load_seed_documents(file.path()).is_err());
    }
}
