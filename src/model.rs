// Core structs: MappingEntry, MatchCandidate, PurchaseItem and the error types
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::MatchConfig;

/// One learned `filename key -> canonical URL` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub key: String,
    pub url: String,
    /// `None` when the backing shape does not record learn times (JSON document).
    pub learned_at: Option<DateTime<Utc>>,
}

impl MappingEntry {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            learned_at: Some(Utc::now()),
        }
    }
}

/// Coarse classification of a marketplace URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UrlKind {
    /// Points at one specific product page (`.../items/<id>`).
    Item,
    /// A search query link, only useful as a fallback.
    Search,
    Unknown,
}

impl UrlKind {
    pub fn classify(url: &str) -> Self {
        if url.contains("/items/") {
            UrlKind::Item
        } else if url.contains("/search/") {
            UrlKind::Search
        } else {
            UrlKind::Unknown
        }
    }
}

/// Strategy that produced a candidate, ordered from most to least trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MatchTier {
    Learned,
    PartialMatch,
    FuzzyMatch,
    SearchFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub url: String,
    pub title: String,
    pub tier: MatchTier,
    pub score: f64,
    /// Stored key the candidate came from; `None` for the search fallback.
    pub matched_key: Option<String>,
}

impl MatchCandidate {
    pub fn url_kind(&self) -> UrlKind {
        UrlKind::classify(&self.url)
    }

    /// Whether the host may act on this candidate without asking the user
    /// (fetch a thumbnail, prefill the URL, learn the mapping).
    pub fn is_auto_actionable(&self, cfg: &MatchConfig) -> bool {
        self.tier != MatchTier::SearchFallback
            && self.url_kind() == UrlKind::Item
            && self.score >= cfg.auto_action_threshold
    }

    /// Whether the candidate is good enough to be shown as a suggestion.
    pub fn is_suggestion(&self) -> bool {
        self.tier != MatchTier::SearchFallback
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchResult {
    pub candidates: Vec<MatchCandidate>,
    /// Search terms extracted from the query's base key.
    pub keywords: Vec<String>,
}

impl MatchResult {
    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }
}

/// Result of a single `learn` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub skipped: usize,
}

/// One purchased product extracted from a purchase-history document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseItem {
    pub title: Option<String>,
    pub url: String,
    pub filename: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub documents: usize,
    pub total_items: usize,
    pub unique_items: usize,
    pub added: usize,
    pub skipped: usize,
    pub items: Vec<PurchaseItem>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),

    #[error("purchase history parse failure: {0}")]
    Parse(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTML parse error: {0}")]
    HtmlParseError(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("unexpected response status {0}")]
    InvalidResponse(u16),

    #[error("no thumbnail found at {0}")]
    MissingThumbnail(String),
}
