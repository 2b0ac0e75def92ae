//! In-memory search backend with term-overlap scoring.
//!
//! Every document is tokenized into lowercase unicode words when it is
//! stored. A query scores each candidate by the share of its distinct terms
//! found anywhere in the document, with a bonus for terms found in the title,
//! so scores always fall in [0, 1].

use super::backend::{BackendError, BackendStats, SearchBackend, SearchQuery, SearchResult};
use super::document::{CollectionStats, Document};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

const TITLE_WEIGHT: f32 = 0.25;
const SNIPPET_WORDS_BEFORE: usize = 12;
const SNIPPET_WORDS_AFTER: usize = 48;

struct IndexedDocument {
    document: Document,
    title_terms: HashSet<String>,
    body_terms: HashSet<String>,
}

impl IndexedDocument {
    fn new(document: Document) -> Self {
        let title_terms: HashSet<String> = tokenize(&document.title).collect();
        let mut body_terms: HashSet<String> = tokenize(&document.content).collect();
        if let Some(section) = &document.section {
            body_terms.extend(tokenize(section));
        }
        body_terms.extend(title_terms.iter().cloned());
        Self {
            document,
            title_terms,
            body_terms,
        }
    }

    fn score(&self, terms: &[String]) -> f32 {
        if terms.is_empty() {
            return 0.0;
        }
        let total = terms.len() as f32;
        let in_body = terms.iter().filter(|t| self.body_terms.contains(*t)).count() as f32;
        let in_title = terms
            .iter()
            .filter(|t| self.title_terms.contains(*t))
            .count() as f32;
        (1.0 - TITLE_WEIGHT) * (in_body / total) + TITLE_WEIGHT * (in_title / total)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(|w| w.to_lowercase())
}

fn query_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Bounded excerpt of `content` around the first word that matches a term.
fn snippet(content: &str, terms: &[String]) -> String {
    let pieces: Vec<&str> = content.split_word_bounds().collect();
    let hit = pieces
        .iter()
        .position(|piece| {
            let lowered = piece.to_lowercase();
            terms.iter().any(|t| *t == lowered)
        })
        .unwrap_or(0);

    // Count words, not separators, when sizing the window.
    let mut start = hit;
    let mut words = 0;
    while start > 0 && words < SNIPPET_WORDS_BEFORE {
        start -= 1;
        if pieces[start].unicode_words().next().is_some() {
            words += 1;
        }
    }
    let mut end = hit;
    words = 0;
    while end < pieces.len() && words < SNIPPET_WORDS_AFTER {
        if pieces[end].unicode_words().next().is_some() {
            words += 1;
        }
        end += 1;
    }

    let mut excerpt = pieces[start..end].concat().trim().to_string();
    if start > 0 {
        excerpt.insert_str(0, "...");
    }
    if end < pieces.len() {
        excerpt.push_str("...");
    }
    excerpt
}

#[derive(Default)]
pub struct InMemorySearchBackend {
    documents: RwLock<BTreeMap<String, IndexedDocument>>,
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let map = documents
            .into_iter()
            .map(|doc| (doc.id.clone(), IndexedDocument::new(doc)))
            .collect();
        Self {
            documents: RwLock::new(map),
        }
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError> {
        let terms = query_terms(&query.text);
        if terms.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }
        let threshold = query.threshold.unwrap_or(0.0);

        let documents = self.documents.read().await;
        let mut scored: Vec<(f32, &IndexedDocument)> = documents
            .values()
            .filter(|indexed| match &query.collection {
                Some(collection) => indexed.document.collection == *collection,
                None => true,
            })
            .map(|indexed| (indexed.score(&terms), indexed))
            .filter(|(score, _)| *score > 0.0 && *score >= threshold)
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(query.limit);

        debug!(
            "memory search '{}' in {:?}: {} hits",
            query.text,
            query.collection,
            scored.len()
        );

        Ok(scored
            .into_iter()
            .map(|(score, indexed)| {
                let doc = &indexed.document;
                SearchResult {
                    id: doc.id.clone(),
                    score,
                    title: doc.title.clone(),
                    content: if query.include_content {
                        doc.content.clone()
                    } else {
                        snippet(&doc.content, &terms)
                    },
                    section: doc.section.clone(),
                    source_collection: doc.collection.clone(),
                    doc_type: doc.doc_type.clone(),
                    path: doc.path.clone(),
                }
            })
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>, BackendError> {
        Ok(self
            .documents
            .read()
            .await
            .get(id)
            .map(|indexed| indexed.document.clone()))
    }

    async fn upsert_document(&self, document: Document) -> Result<(), BackendError> {
        if document.id.trim().is_empty() {
            return Err(BackendError::InvalidDocument(
                "document id must not be empty".to_string(),
            ));
        }
        let id = document.id.clone();
        self.documents
            .write()
            .await
            .insert(id, IndexedDocument::new(document));
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<bool, BackendError> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionStats>, BackendError> {
        let documents = self.documents.read().await;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for indexed in documents.values() {
            *counts.entry(indexed.document.collection.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, documents)| CollectionStats {
                name: name.to_string(),
                documents,
            })
            .collect())
    }

    async fn rebuild(&self) -> Result<usize, BackendError> {
        let mut documents = self.documents.write().await;
        let rebuilt: BTreeMap<String, IndexedDocument> = std::mem::take(&mut *documents)
            .into_iter()
            .map(|(id, indexed)| (id, IndexedDocument::new(indexed.document)))
            .collect();
        *documents = rebuilt;
        Ok(documents.len())
    }

    async fn stats(&self) -> Result<BackendStats, BackendError> {
        let documents = self.documents.read().await;
        let collections: HashSet<&str> = documents
            .values()
            .map(|indexed| indexed.document.collection.as_str())
            .collect();
        Ok(BackendStats {
            kind: self.kind().to_string(),
            documents: documents.len(),
            collections: collections.len(),
        })
    }
}
