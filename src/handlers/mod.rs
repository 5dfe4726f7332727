// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT access token + live user row)

pub mod public; // Token acquisition: /api/auth/register, /login, /token/refresh
pub mod protected; // Everything else under /api/*

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "LMS API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Project tracker with completion rewards",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "public_auth": "/api/auth/register, /api/auth/login, /api/auth/token/refresh (public)",
            "auth": "/api/auth/logout (protected)",
            "profile": "/api/profile (protected)",
            "projects": "/api/projects[/:id] (protected)",
            "notifications": "/api/notifications (protected)",
            "reward": "/api/reward (protected)",
        }
    }))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE"
                })),
            )
        }
    }
}
