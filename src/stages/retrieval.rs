//! Retrieval stage: keywords to ranked documents and a context passage.

use std::sync::Arc;
use tracing::debug;

use super::StageError;
use crate::collaborators::SearchBackend;
use crate::types::RetrievedDoc;

/// Fields owned by retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutput {
    /// Descending by score
    pub retrieved_docs: Vec<RetrievedDoc>,
    /// Empty when nothing was found
    pub context: String,
}

/// Render documents as `[Doc N, relevance: S]` blocks separated by a blank line.
pub fn format_context(docs: &[RetrievedDoc]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("[Doc {}, relevance: {:.2}]\n{}", i + 1, doc.score, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct RetrievalStage {
    search: Arc<dyn SearchBackend>,
    top_k: usize,
}

impl RetrievalStage {
    pub fn new(search: Arc<dyn SearchBackend>, top_k: usize) -> Self {
        Self { search, top_k }
    }

    pub async fn run(&self, keywords: &[String]) -> Result<RetrievalOutput, StageError> {
        if keywords.is_empty() {
            return Err(StageError::InvalidInput("keywords are empty".to_string()));
        }

        let query = keywords.join(" ");
        let mut docs = self.search.search(&query, self.top_k).await?;

        // Backends are trusted for content, not for ordering or range
        for doc in &mut docs {
            doc.score = if doc.score.is_nan() { 0.0 } else { doc.score.clamp(0.0, 1.0) };
        }
        docs.sort_by(|a, b| b.score.total_cmp(&a.score));
        docs.truncate(self.top_k);

        let context = format_context(&docs);
        debug!(
            backend = self.search.backend_name(),
            %query,
            hits = docs.len(),
            "Retrieval complete"
        );

        Ok(RetrievalOutput {
            retrieved_docs: docs,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSearch {
        docs: Vec<RetrievedDoc>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl SearchBackend for RecordingSearch {
        async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>, CollaboratorError> {
            self.queries.lock().unwrap().push((query.to_string(), top_k));
            Ok(self.docs.clone())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn doc(content: &str, score: f64) -> RetrievedDoc {
        RetrievedDoc {
            content: content.to_string(),
            metadata: serde_json::Value::Null,
            score,
        }
    }

    #[test]
    fn test_format_context() {
        let docs = vec![doc("Reset via email.", 0.9), doc("Accounts lock after 5 tries.", 0.456)];
        assert_eq!(
            format_context(&docs),
            "[Doc 1, relevance: 0.90]\nReset via email.\n\n[Doc 2, relevance: 0.46]\nAccounts lock after 5 tries."
        );
        assert_eq!(format_context(&[]), "");
    }

    #[tokio::test]
    async fn test_query_joins_keywords_with_single_space() {
        let search = Arc::new(RecordingSearch {
            docs: vec![doc("Reset via email.", 0.9)],
            queries: Mutex::new(Vec::new()),
        });
        let stage = RetrievalStage::new(search.clone(), 3);
        let out = stage.run(&["login".into(), "password".into()]).await.unwrap();

        assert_eq!(search.queries.lock().unwrap()[0], ("login password".to_string(), 3));
        assert_eq!(out.retrieved_docs.len(), 1);
        assert_eq!(out.context, "[Doc 1, relevance: 0.90]\nReset via email.");
    }

    #[tokio::test]
    async fn test_results_reordered_and_clamped() {
        let search = Arc::new(RecordingSearch {
            docs: vec![doc("low", 0.2), doc("high", 1.7), doc("mid", 0.5)],
            queries: Mutex::new(Vec::new()),
        });
        let out = RetrievalStage::new(search, 2).run(&["x".into()]).await.unwrap();
        let contents: Vec<&str> = out.retrieved_docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["high", "mid"]);
        assert!((out.retrieved_docs[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_zero_results_give_empty_context() {
        let search = Arc::new(RecordingSearch {
            docs: Vec::new(),
            queries: Mutex::new(Vec::new()),
        });
        let out = RetrievalStage::new(search, 3).run(&["x".into()]).await.unwrap();
        assert!(out.retrieved_docs.is_empty());
        assert_eq!(out.context, "");
    }

    #[tokio::test]
    async fn test_empty_keywords_rejected() {
        let search = Arc::new(RecordingSearch {
            docs: Vec::new(),
            queries: Mutex::new(Vec::new()),
        });
        let err = RetrievalStage::new(search, 3).run(&[]).await.unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }
}
