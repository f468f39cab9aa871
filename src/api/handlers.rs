//! API route handlers
//!
//! Request handling for ticket submission, lookup and analytics. Handlers
//! validate at the boundary; nothing malformed reaches the pipeline.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::envelope::ApiErrorResponse;
use crate::config::ServerConfig;
use crate::pipeline::WorkflowOrchestrator;
use crate::storage::{StoredTicket, TicketStore};
use crate::types::{Category, Priority, TicketOutcome};

// ============================================================================
// API State
// ============================================================================

/// HTTP-level settings taken from `[server]`
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub default_list_limit: usize,
    pub max_list_limit: usize,
}

impl From<&ServerConfig> for ApiSettings {
    fn from(server: &ServerConfig) -> Self {
        Self {
            cors_origins: server.cors_origins.clone(),
            max_body_bytes: server.max_body_bytes,
            default_list_limit: server.default_list_limit,
            max_list_limit: server.max_list_limit,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub store: Arc<dyn TicketStore>,
    pub settings: ApiSettings,
}

impl ApiState {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>, store: Arc<dyn TicketStore>) -> Self {
        Self {
            orchestrator,
            store,
            settings: ApiSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ApiSettings) -> Self {
        self.settings = settings;
        self
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub content: String,
}

/// Result of `POST /api/tickets`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TicketResponse {
    pub ticket_id: String,
    pub category: Category,
    pub priority: Priority,
    pub response: String,
    pub confidence: f64,
    pub escalated: bool,
    pub escalation_reason: String,
    pub response_time: f64,
}

impl From<TicketOutcome> for TicketResponse {
    fn from(o: TicketOutcome) -> Self {
        Self {
            ticket_id: o.ticket_id,
            category: o.category,
            priority: o.priority,
            response: o.response,
            confidence: o.confidence,
            escalated: o.escalated,
            escalation_reason: o.escalation_reason,
            response_time: o.response_time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TicketList {
    pub tickets: Vec<StoredTicket>,
    pub count: usize,
}

/// `TICKET-` followed by the first 8 hex digits of a v4 UUID, upper-cased
pub fn new_ticket_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("TICKET-{}", uuid[..8].to_uppercase())
}

// ============================================================================
// Service endpoints
// ============================================================================

/// GET / - service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "ticketflow",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "docs": "/api",
    }))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ============================================================================
// Tickets
// ============================================================================

/// POST /api/tickets - run a ticket through the pipeline and store it
pub async fn create_ticket(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return ApiErrorResponse::payload_too_large(rejection.body_text());
        }
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    if request.content.trim().is_empty() {
        return ApiErrorResponse::bad_request("Ticket content cannot be empty");
    }

    let ticket_id = new_ticket_id();
    let processed = match state.orchestrator.process(&ticket_id, &request.content).await {
        Ok(s) => s,
        Err(e) if e.is_client_error() => return ApiErrorResponse::bad_request(e.to_string()),
        Err(e) => return ApiErrorResponse::internal(format!("Ticket processing failed: {e}")),
    };

    if let Err(e) = state.store.save(&processed) {
        error!(ticket_id = %ticket_id, error = %e, backend = state.store.backend_name(), "Failed to store ticket");
        return ApiErrorResponse::internal(format!("Storage error: {e}"));
    }

    match processed.outcome() {
        Ok(outcome) => {
            info!(ticket_id = %ticket_id, escalated = outcome.escalated, "Ticket created");
            Json(TicketResponse::from(outcome)).into_response()
        }
        Err(e) => ApiErrorResponse::internal(format!("Incomplete ticket state: {e}")),
    }
}

/// GET /api/tickets/:id
pub async fn get_ticket(State(state): State<ApiState>, Path(ticket_id): Path<String>) -> Response {
    match state.store.get(&ticket_id) {
        Ok(Some(ticket)) => Json(ticket).into_response(),
        Ok(None) => ApiErrorResponse::not_found(format!("Ticket {ticket_id} not found")),
        Err(e) => ApiErrorResponse::internal(format!("Storage error: {e}")),
    }
}

/// GET /api/tickets?limit=N - most recent first
pub async fn list_tickets(
    State(state): State<ApiState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    let limit = params
        .limit
        .unwrap_or(state.settings.default_list_limit)
        .min(state.settings.max_list_limit);

    match state.store.list_recent(limit) {
        Ok(tickets) => {
            let count = tickets.len();
            Json(TicketList { tickets, count }).into_response()
        }
        Err(e) => ApiErrorResponse::internal(format!("Storage error: {e}")),
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// GET /api/analytics - summary over every processed ticket
pub async fn analytics_summary(State(state): State<ApiState>) -> Response {
    Json(state.orchestrator.metrics().summary()).into_response()
}

/// GET /api/analytics/tickets - per-ticket snapshots
pub async fn analytics_tickets(State(state): State<ApiState>) -> Response {
    let snapshots = state.orchestrator.metrics().snapshots();
    Json(serde_json::json!({
        "count": snapshots.len(),
        "tickets": snapshots,
    }))
    .into_response()
}

/// GET /api/analytics/categories
pub async fn analytics_categories(State(state): State<ApiState>) -> Response {
    Json(state.orchestrator.metrics().category_breakdown()).into_response()
}

/// GET /api/analytics/priorities
pub async fn analytics_priorities(State(state): State<ApiState>) -> Response {
    Json(state.orchestrator.metrics().priority_breakdown()).into_response()
}
