//! HTTP routing.
//!
//! ```text
//!   /health                    unauthenticated
//!   /api/sales/...             routes/sales.rs
//!   /api/products/...          routes/products.rs
//!   /api/bills/...             routes/bills.rs
//! ```
//!
//! Handlers take an [`Authenticated`](crate::auth::Authenticated) caller,
//! hand it to a service and shape the response. Authorization decisions
//! live in the services.

pub mod bills;
pub mod products;
pub mod sales;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/sales", sales::router())
        .nest("/api/products", products::router())
        .nest("/api/bills", bills::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
    version: &'static str,
}

/// Liveness plus database reachability. `503` when the database does not
/// answer.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "down")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
