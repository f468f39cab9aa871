//! Keyword Document Index
//!
//! In-memory search over support documentation. Relevance is keyword and
//! content term matching normalized to [0, 1]; production deployments can
//! swap in a vector store behind the same [`SearchBackend`] trait.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::collaborators::{CollaboratorError, SearchBackend};
use crate::types::RetrievedDoc;

/// Points for a query term that matches a document keyword
const KEYWORD_WEIGHT: f64 = 2.0;
/// Points for a query term that appears in the document body
const CONTENT_WEIGHT: f64 = 1.0;
/// Terms shorter than this never match
const MIN_TERM_LEN: usize = 2;

/// Support document with search keywords
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(content: &str, keywords: &[&str], topic: &str) -> Self {
        Self {
            content: content.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            metadata: serde_json::json!({ "topic": topic }),
        }
    }
}

/// Errors loading documents into the index
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("knowledge file I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("knowledge file parse error ({0:?}): {1}")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("knowledge index lock poisoned")]
    Poisoned,
}

/// Built-in support documentation
fn seed_documents() -> Vec<Document> {
    vec![
        Document::new(
            "To reset your password, click 'Forgot password' on the login page and follow the link we email you. Reset links expire after 24 hours.",
            &["password", "reset", "forgot", "login", "link", "email"],
            "account",
        ),
        Document::new(
            "If you cannot log into your account, confirm that caps lock is off and that you are using the email address you signed up with. After five failed attempts the account is locked for 15 minutes.",
            &["login", "log", "account", "locked", "signin", "access"],
            "account",
        ),
        Document::new(
            "Single sign-on users must log in through their company identity provider. Contact your workspace administrator if SSO redirects fail.",
            &["sso", "single", "sign", "login", "identity", "provider"],
            "account",
        ),
        Document::new(
            "Verification and notification emails can take up to 10 minutes to arrive. Check your spam folder and add our sending domain to your allow list.",
            &["email", "verification", "notification", "spam", "delivery"],
            "account",
        ),
        Document::new(
            "Charges appear on the first day of each billing cycle. If you see a duplicate charge, it is usually a pending authorization that drops off within 3-5 business days.",
            &["billing", "charge", "charged", "duplicate", "twice", "payment", "invoice"],
            "billing",
        ),
        Document::new(
            "Refunds for annual plans are available within 30 days of purchase. Monthly plans are not refunded but can be cancelled at any time from the billing settings page.",
            &["refund", "billing", "cancel", "subscription", "plan"],
            "billing",
        ),
        Document::new(
            "You can upgrade or downgrade your plan from Settings > Billing. Changes take effect immediately and are prorated on your next invoice.",
            &["upgrade", "downgrade", "plan", "billing", "invoice", "subscription"],
            "billing",
        ),
        Document::new(
            "The API allows 100 requests per minute per key. Requests over the limit receive HTTP 429; retry after the number of seconds in the Retry-After header.",
            &["api", "rate", "limit", "429", "requests", "error"],
            "technical",
        ),
        Document::new(
            "If the app crashes or shows a blank screen, clear your browser cache, disable extensions, and make sure you are on a supported browser version.",
            &["crash", "error", "blank", "browser", "cache", "bug"],
            "technical",
        ),
        Document::new(
            "Feature requests are reviewed by the product team every month. Submit ideas from the feedback portal so other customers can vote on them.",
            &["feature", "request", "idea", "feedback", "roadmap", "suggestion"],
            "feature_request",
        ),
    ]
}

/// Thread-safe keyword index implementing [`SearchBackend`]
pub struct KeywordIndex {
    documents: RwLock<Vec<Document>>,
}

impl KeywordIndex {
    /// Index pre-loaded with the built-in support documentation
    pub fn with_seed_documents() -> Self {
        Self::from_documents(seed_documents())
    }

    /// Empty index
    pub fn empty() -> Self {
        Self::from_documents(Vec::new())
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Append documents; returns the new document count
    pub fn add_documents(&self, docs: Vec<Document>) -> Result<usize, KnowledgeError> {
        let mut documents = self.documents.write().map_err(|_| KnowledgeError::Poisoned)?;
        documents.extend(docs);
        Ok(documents.len())
    }

    /// Load a JSON array of `{content, keywords?, metadata?}` documents
    pub fn load_file(&self, path: &Path) -> Result<usize, KnowledgeError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeError::Io(path.to_path_buf(), e))?;
        let docs: Vec<Document> = serde_json::from_str(&raw)
            .map_err(|e| KnowledgeError::Parse(path.to_path_buf(), e))?;
        let added = docs.len();
        let total = self.add_documents(docs)?;
        info!(path = %path.display(), added, total, "Loaded knowledge documents");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank documents against a whitespace-separated query
    pub fn query(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>, KnowledgeError> {
        let terms = query_terms(query);
        if terms.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().map_err(|_| KnowledgeError::Poisoned)?;
        let mut scored: Vec<(f64, &Document)> = documents
            .iter()
            .map(|doc| (relevance(&terms, doc), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, doc)| RetrievedDoc {
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                score,
            })
            .collect())
    }
}

impl Default for KeywordIndex {
    fn default() -> Self {
        Self::with_seed_documents()
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| t.len() >= MIN_TERM_LEN)
        .collect()
}

/// Normalized relevance: each term earns at most keyword + content weight
fn relevance(terms: &[String], doc: &Document) -> f64 {
    let content = doc.content.to_lowercase();
    let mut points = 0.0;

    for term in terms {
        if doc.keywords.iter().any(|k| keyword_matches(k, term)) {
            points += KEYWORD_WEIGHT;
        }
        if content.contains(term.as_str()) {
            points += CONTENT_WEIGHT;
        }
    }

    let max_points = terms.len() as f64 * (KEYWORD_WEIGHT + CONTENT_WEIGHT);
    (points / max_points).clamp(0.0, 1.0)
}

/// Exact match, or substring match once both sides are long enough to be
/// meaningful ("charge" matches "charged", "log" does not match "blog")
fn keyword_matches(keyword: &str, term: &str) -> bool {
    keyword == term
        || (keyword.len() >= 4 && term.contains(keyword))
        || (term.len() >= 4 && keyword.contains(term))
}

#[async_trait]
impl SearchBackend for KeywordIndex {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>, CollaboratorError> {
        let results = self
            .query(query, top_k)
            .map_err(|e| CollaboratorError::unavailable("search", e))?;
        debug!(query, hits = results.len(), "Keyword search complete");
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "keyword-index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_query_ranks_reset_doc_first() {
        let index = KeywordIndex::with_seed_documents();
        let results = index.query("password reset", 3).unwrap();
        assert!(!results.is_empty());
        assert!(results[0].content.contains("reset your password"));
    }

    #[test]
    fn test_scores_are_normalized_and_descending() {
        let index = KeywordIndex::with_seed_documents();
        let results = index.query("billing charged twice refund", 5).unwrap();
        assert!(!results.is_empty());
        for doc in &results {
            assert!(doc.score > 0.0 && doc.score <= 1.0, "score {} out of range", doc.score);
        }
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_top_k_truncates() {
        let index = KeywordIndex::with_seed_documents();
        assert!(index.query("login account billing email", 2).unwrap().len() <= 2);
        assert!(index.query("login", 0).unwrap().is_empty());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let index = KeywordIndex::with_seed_documents();
        assert!(index.query("zzzz qqqq", 3).unwrap().is_empty());
        assert!(index.query("", 3).unwrap().is_empty());
    }

    #[test]
    fn test_add_documents_and_metadata() {
        let index = KeywordIndex::empty();
        assert!(index.is_empty());
        let total = index
            .add_documents(vec![Document::new("Dark mode ships in Q3.", &["dark", "mode"], "roadmap")])
            .unwrap();
        assert_eq!(total, 1);
        let results = index.query("dark mode", 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata["topic"], "roadmap");
        assert!((results[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"[{"content": "Invoices are emailed monthly.", "keywords": ["invoice"]},
               {"content": "Exports run nightly."}]"#,
        )
        .unwrap();
        let index = KeywordIndex::empty();
        assert_eq!(index.load_file(&path).unwrap(), 2);
        assert_eq!(index.len(), 2);
        assert!(!index.query("exports", 3).unwrap().is_empty());
    }

    #[test]
    fn test_load_file_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "not json").unwrap();
        let err = KeywordIndex::empty().load_file(&path).unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse(..)));
    }
}
