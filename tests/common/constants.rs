//! Shared constants for end-to-end tests
//!
//! When the seed corpus changes, update only this file and `fixtures.rs`.

// ============================================================================
// Collections
// ============================================================================

pub const COLLECTION_A: &str = "docs-a";

pub const COLLECTION_B: &str = "docs-b";

/// A collection no seed document belongs to
pub const UNKNOWN_COLLECTION: &str = "docs-missing";

// ============================================================================
// Documents
// ============================================================================

/// "Getting started" in docs-a
pub const DOC_A1_ID: &str = "a-1";

/// "Search configuration" in docs-a
pub const DOC_A2_ID: &str = "a-2";

/// "Search API reference" in docs-b
pub const DOC_B1_ID: &str = "b-1";

/// "Deployment" in docs-b
pub const DOC_B2_ID: &str = "b-2";

pub const SEED_DOCUMENT_COUNT: usize = 4;

/// Term present in documents of both collections
pub const SHARED_TERM: &str = "search";

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const STREAM_EVENT_TIMEOUT_MS: u64 = 3000;
