//! Document Methods
//!
//! Search, lookup and maintenance of indexed documents.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::rpc::methods::{
    COLLECTION_LIST, DOCUMENT_DELETE, DOCUMENT_GET, DOCUMENT_INDEX, DOCUMENT_SEARCH, INDEX_REBUILD,
};
use crate::rpc::registry::{MethodBuilder, MethodResult, RegisteredMethod};
use crate::rpc::{DispatchError, MethodContext, MethodRegistry, RegistryError};
use crate::search::{Document, SearchQuery, SearchResult, DEFAULT_COLLECTION, DEFAULT_DOC_TYPE};
use crate::streaming::INDEX_TOPIC;

/// Register document methods with the registry
pub fn register_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(document_search_method()?)?;
    registry.register(document_get_method()?)?;
    registry.register(document_index_method()?)?;
    registry.register(document_delete_method()?)?;
    registry.register(collection_list_method()?)?;
    registry.register(index_rebuild_method()?)?;
    Ok(())
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, DispatchError> {
    serde_json::from_value(params).map_err(|e| DispatchError::invalid_params("params", e.to_string()))
}

// ============================================================================
// document.search
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    threshold: Option<f32>,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    filters: Option<SearchFilters>,
    #[serde(default)]
    include_content: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchFilters {
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    collection_name: Option<String>,
}

impl SearchParams {
    /// `filters.collection` wins over `filters.collection_name`, which wins
    /// over a top-level `collection`. Blank names count as absent.
    fn collection(&self) -> Option<String> {
        let filters = self.filters.as_ref();
        filters
            .and_then(|f| f.collection.clone())
            .or_else(|| filters.and_then(|f| f.collection_name.clone()))
            .or_else(|| self.collection.clone())
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
    total: usize,
    search_metadata: SearchMetadata,
}

#[derive(Debug, Serialize)]
struct SearchHit {
    #[serde(flatten)]
    result: SearchResult,
    metadata: HitMetadata,
}

#[derive(Debug, Serialize)]
struct HitMetadata {
    collection: String,
    section: Option<String>,
    doc_type: String,
}

#[derive(Debug, Serialize)]
struct SearchMetadata {
    query: String,
    collection: Option<String>,
    total: usize,
    limit: usize,
    threshold: Option<f32>,
    took_ms: u64,
}

fn document_search_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(DOCUMENT_SEARCH)
        .description("Search indexed documents, optionally restricted to one collection")
        .params_schema(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search text",
                    "minLength": 1
                },
                "limit": {
                    "type": ["integer", "null"],
                    "description": "Maximum number of results (default from configuration)",
                    "minimum": 1
                },
                "threshold": {
                    "type": ["number", "null"],
                    "description": "Minimum relevance score",
                    "minimum": 0,
                    "maximum": 1
                },
                "collection": {
                    "type": ["string", "null"],
                    "description": "Collection to search; all collections when absent"
                },
                "filters": {
                    "type": ["object", "null"],
                    "properties": {
                        "collection": {"type": ["string", "null"]},
                        "collection_name": {"type": ["string", "null"]}
                    }
                },
                "include_content": {
                    "type": ["boolean", "null"],
                    "description": "Return whole documents instead of snippets"
                }
            },
            "required": ["query"]
        }))
        .tool()
        .build(document_search_handler)
}

async fn document_search_handler(ctx: MethodContext, params: Value) -> MethodResult {
    let started = Instant::now();
    let params: SearchParams = decode(params)?;
    if params.query.trim().is_empty() {
        return Err(DispatchError::invalid_params(
            "query",
            "query must not be blank",
        ));
    }

    let limit = ctx.search().effective_limit(params.limit);
    let collection = params.collection();
    let query = SearchQuery {
        text: params.query.clone(),
        collection: collection.clone(),
        threshold: params.threshold,
        limit,
        include_content: params.include_content.unwrap_or(false),
    };

    let results = ctx.search().search(&query).await?;
    let total = results.len();
    let results = results
        .into_iter()
        .map(|result| SearchHit {
            metadata: HitMetadata {
                collection: result.source_collection.clone(),
                section: result.section.clone(),
                doc_type: result.doc_type.clone(),
            },
            result,
        })
        .collect();

    let response = SearchResponse {
        query: params.query.clone(),
        results,
        total,
        search_metadata: SearchMetadata {
            query: params.query,
            collection,
            total,
            limit,
            threshold: params.threshold,
            took_ms: started.elapsed().as_millis() as u64,
        },
    };
    Ok(serde_json::to_value(response)?)
}

// ============================================================================
// document.get
// ============================================================================

#[derive(Debug, Deserialize)]
struct DocumentIdParams {
    id: String,
}

fn id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "minLength": 1, "description": "Document id"}
        },
        "required": ["id"]
    })
}

fn document_get_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(DOCUMENT_GET)
        .description("Fetch one indexed document by id")
        .params_schema(id_schema())
        .tool()
        .build(document_get_handler)
}

async fn document_get_handler(ctx: MethodContext, params: Value) -> MethodResult {
    let params: DocumentIdParams = decode(params)?;
    match ctx.search().get_document(&params.id).await? {
        Some(document) => Ok(serde_json::to_value(document)?),
        None => Err(DispatchError::NotFound(format!("document '{}'", params.id))),
    }
}

// ============================================================================
// document.index
// ============================================================================

#[derive(Debug, Deserialize)]
struct IndexParams {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    content: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct MutationResult {
    success: bool,
    message: String,
    document_id: String,
}

fn document_index_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(DOCUMENT_INDEX)
        .description("Add a document to the index, replacing any document with the same id")
        .params_schema(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "minLength": 1},
                "title": {"type": "string"},
                "content": {"type": "string", "minLength": 1},
                "section": {"type": "string"},
                "collection": {"type": "string", "minLength": 1},
                "doc_type": {"type": "string", "minLength": 1},
                "path": {"type": "string"}
            },
            "required": ["content"]
        }))
        .tool()
        .build(document_index_handler)
}

async fn document_index_handler(ctx: MethodContext, params: Value) -> MethodResult {
    let params: IndexParams = decode(params)?;
    let document = Document {
        id: params.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: params.title.unwrap_or_default(),
        content: params.content,
        section: params.section,
        collection: params
            .collection
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        doc_type: params
            .doc_type
            .unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
        path: params.path,
    };
    let document_id = document.id.clone();
    let collection = document.collection.clone();

    ctx.search().upsert_document(document).await?;
    info!("Indexed document {} in {}", document_id, collection);

    ctx.services.events.publish(
        INDEX_TOPIC,
        json!({
            "event": "document_indexed",
            "document_id": document_id,
            "collection": collection,
        }),
    );

    Ok(serde_json::to_value(MutationResult {
        success: true,
        message: "Document indexed".to_string(),
        document_id,
    })?)
}

// ============================================================================
// document.delete
// ============================================================================

fn document_delete_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(DOCUMENT_DELETE)
        .description("Remove a document from the index")
        .params_schema(id_schema())
        .tool()
        .build(document_delete_handler)
}

async fn document_delete_handler(ctx: MethodContext, params: Value) -> MethodResult {
    let params: DocumentIdParams = decode(params)?;
    if !ctx.search().delete_document(&params.id).await? {
        return Err(DispatchError::NotFound(format!("document '{}'", params.id)));
    }
    info!("Deleted document {}", params.id);

    ctx.services.events.publish(
        INDEX_TOPIC,
        json!({"event": "document_deleted", "document_id": params.id}),
    );

    Ok(serde_json::to_value(MutationResult {
        success: true,
        message: "Document deleted".to_string(),
        document_id: params.id,
    })?)
}

// ============================================================================
// collection.list
// ============================================================================

fn collection_list_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(COLLECTION_LIST)
        .description("List collections with their document counts")
        .tool()
        .build(collection_list_handler)
}

async fn collection_list_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    let collections = ctx.search().list_collections().await?;
    Ok(json!({
        "count": collections.len(),
        "collections": collections,
    }))
}

// ============================================================================
// index.rebuild
// ============================================================================

fn index_rebuild_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(INDEX_REBUILD)
        .description("Rebuild derived index data for every document")
        .tool()
        .build(index_rebuild_handler)
}

async fn index_rebuild_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    let documents = ctx.search().rebuild().await?;
    info!("Index rebuilt with {} documents", documents);

    ctx.services.events.publish(
        INDEX_TOPIC,
        json!({"event": "index_rebuilt", "documents": documents}),
    );

    Ok(json!({"success": true, "documents": documents}))
}
