//! In-process fake collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ticketflow::collaborators::{
    Classifier, CollaboratorError, GenerationRequest, Generator, Judge, Judgment, Resolution,
    SearchBackend, StructuredReply, Triage,
};
use ticketflow::{Category, Collaborators, MetricsStore, Priority, RetrievedDoc, WorkflowOrchestrator};

// ============================================================================
// Fakes
// ============================================================================

pub struct FakeClassifier {
    pub reply: Result<StructuredReply<Triage>, CollaboratorError>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(&self, _text: &str) -> Result<StructuredReply<Triage>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub struct FakeSearch {
    pub reply: Result<Vec<RetrievedDoc>, CollaboratorError>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDoc>, CollaboratorError> {
        self.queries.lock().unwrap().push((query.to_string(), top_k));
        self.reply.clone()
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeGenerator {
    pub reply: Result<StructuredReply<Resolution>, CollaboratorError>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<StructuredReply<Resolution>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

pub struct FakeJudge {
    pub reply: Result<Judgment, CollaboratorError>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Judge for FakeJudge {
    async fn judge(&self, _: &str, _: Category, _: f64) -> Result<Judgment, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A scripted set of collaborators plus handles for inspecting calls
pub struct Harness {
    pub classifier: Arc<FakeClassifier>,
    pub search: Arc<FakeSearch>,
    pub generator: Arc<FakeGenerator>,
    pub judge: Arc<FakeJudge>,
}

impl Harness {
    /// Login scenario: technical/high, one doc at 0.9, confidence 0.85, judge approves
    pub fn login() -> Self {
        Self {
            classifier: Arc::new(FakeClassifier {
                reply: Ok(StructuredReply::Parsed(triage(
                    Category::Technical,
                    Priority::High,
                    &["login", "password"],
                ))),
                calls: AtomicUsize::new(0),
            }),
            search: Arc::new(FakeSearch {
                reply: Ok(vec![doc("Reset your password from the login page.", 0.9)]),
                queries: Mutex::new(Vec::new()),
            }),
            generator: Arc::new(FakeGenerator {
                reply: Ok(StructuredReply::Parsed(Resolution {
                    response: "Click 'Forgot password' on the login page.".to_string(),
                    confidence: 0.85,
                })),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }),
            judge: Arc::new(FakeJudge {
                reply: Ok(Judgment {
                    escalate: false,
                    reason: "Standard password reset".to_string(),
                }),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn with_triage(mut self, reply: Result<StructuredReply<Triage>, CollaboratorError>) -> Self {
        self.classifier = Arc::new(FakeClassifier {
            reply,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_search(mut self, reply: Result<Vec<RetrievedDoc>, CollaboratorError>) -> Self {
        self.search = Arc::new(FakeSearch {
            reply,
            queries: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn with_resolution(mut self, reply: Result<StructuredReply<Resolution>, CollaboratorError>) -> Self {
        self.generator = Arc::new(FakeGenerator {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_generator_delay(mut self, delay: Duration) -> Self {
        self.generator = Arc::new(FakeGenerator {
            reply: self.generator.reply.clone(),
            delay,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_judgment(mut self, reply: Result<Judgment, CollaboratorError>) -> Self {
        self.judge = Arc::new(FakeJudge {
            reply,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            classifier: self.classifier.clone(),
            search: self.search.clone(),
            generator: self.generator.clone(),
            judge: self.judge.clone(),
        }
    }

    pub fn orchestrator(&self) -> (WorkflowOrchestrator, Arc<MetricsStore>) {
        let metrics = Arc::new(MetricsStore::new());
        (
            WorkflowOrchestrator::new(self.collaborators(), 3, metrics.clone()),
            metrics,
        )
    }

    pub fn judge_calls(&self) -> usize {
        self.judge.calls.load(Ordering::SeqCst)
    }

    pub fn classifier_calls(&self) -> usize {
        self.classifier.calls.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn triage(category: Category, priority: Priority, keywords: &[&str]) -> Triage {
    Triage {
        category,
        priority,
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
    }
}

pub fn doc(content: &str, score: f64) -> RetrievedDoc {
    RetrievedDoc {
        content: content.to_string(),
        metadata: serde_json::json!({ "source": "test" }),
        score,
    }
}

pub fn resolution(response: &str, confidence: f64) -> Result<StructuredReply<Resolution>, CollaboratorError> {
    Ok(StructuredReply::Parsed(Resolution {
        response: response.to_string(),
        confidence,
    }))
}
