use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde_json::Value;

use super::{values, ListQuery};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, RequestTime};

/// GET /api/v1/bookings/mine
pub async fn mine(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Extension(RequestTime(at)): Extension<RequestTime>,
    query: ListQuery,
) -> ApiResult<Value> {
    let bookings = state
        .resources
        .bookings
        .list(&query.0, &Filter::eq("user", me.id))
        .await?;
    Ok(ApiResponse::list("bookings", values(bookings), &at))
}

/// GET /api/v1/bookings
pub async fn list(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    query: ListQuery,
) -> ApiResult<Value> {
    let bookings = state.resources.bookings.list(&query.0, &Filter::new()).await?;
    Ok(ApiResponse::list("bookings", values(bookings), &at))
}

/// GET /api/v1/bookings/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let booking = state.resources.bookings.get_one(&id).await?;
    Ok(ApiResponse::document("booking", booking))
}

/// POST /api/v1/bookings
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let booking = state.resources.bookings.create(body, me.actor()).await?;
    Ok(ApiResponse::document("booking", booking).status(StatusCode::CREATED))
}

/// PATCH /api/v1/bookings/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let booking = state.resources.bookings.update(&id, body, me.actor()).await?;
    Ok(ApiResponse::document("booking", booking))
}

/// DELETE /api/v1/bookings/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    state.resources.bookings.delete(&id, me.actor()).await?;
    Ok(ApiResponse::no_content())
}
