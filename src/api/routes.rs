//! API route definitions
//!
//! - `/api/tickets` - submit (POST) and list (GET) tickets
//! - `/api/tickets/:id` - single ticket lookup
//! - `/api/analytics` - summary, plus `/tickets`, `/categories`, `/priorities`
//! - `/` and `/health` - service banner and liveness

use axum::routing::get;
use axum::Router;

use super::handlers::{self, ApiState};

/// Ticket and analytics routes, mounted under `/api`
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route(
            "/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route("/tickets/:id", get(handlers::get_ticket))
        .route("/analytics", get(handlers::analytics_summary))
        .route("/analytics/tickets", get(handlers::analytics_tickets))
        .route("/analytics/categories", get(handlers::analytics_categories))
        .route("/analytics/priorities", get(handlers::analytics_priorities))
        .with_state(state)
}

/// Root-level service routes
pub fn service_routes() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
}
