use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::types::now_string;

/// GET / - service info
pub async fn root() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "status": "success",
        "data": {
            "name": "Natours API",
            "version": version,
            "description": "Tour booking backend",
            "endpoints": {
                "tours": "/api/v1/tours[/:id] (public reads, admin and lead-guide writes)",
                "reviews": "/api/v1/reviews[/:id], /api/v1/tours/:id/reviews (protected)",
                "bookings": "/api/v1/bookings[/:id], /api/v1/bookings/mine (protected)",
                "users": "/api/v1/users/signup, /login, /logout, /forgot-password, /reset-password/:token, /me",
                "health": "/health (public)",
            }
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = now_string();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": { "status": "ok", "timestamp": now, "store": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "store unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Can't find {} on this server.", uri.path()))
}
