use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use super::{values, ListQuery};
use crate::app::AppState;
use crate::auth::{CurrentUser, Identity};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, RequestTime};
use crate::types::{Document, Role};

const NOT_OWNER: &str = "You can only modify your own reviews";

/// GET /api/v1/reviews
pub async fn list(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    query: ListQuery,
) -> ApiResult<Value> {
    let reviews = state.resources.reviews.list(&query.0, &Filter::new()).await?;
    Ok(ApiResponse::list("reviews", values(reviews), &at))
}

/// GET /api/v1/tours/:id/reviews
pub async fn list_for_tour(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    Path(tour_id): Path<String>,
    query: ListQuery,
) -> ApiResult<Value> {
    let reviews = state
        .resources
        .reviews
        .list(&query.0, &Filter::eq("tour", tour_id))
        .await?;
    Ok(ApiResponse::list("reviews", values(reviews), &at))
}

/// POST /api/v1/reviews
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    insert(&state, me, body).await
}

/// POST /api/v1/tours/:id/reviews
pub async fn create_for_tour(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(tour_id): Path<String>,
    JsonBody(mut body): JsonBody,
) -> ApiResult<Value> {
    body.entry("tour").or_insert_with(|| json!(tour_id));
    insert(&state, me, body).await
}

async fn insert(state: &AppState, me: Identity, mut body: Document) -> ApiResult<Value> {
    body.entry("user").or_insert_with(|| json!(me.id));
    let review = state.resources.reviews.create(body, me.actor()).await?;
    Ok(ApiResponse::document("review", review).status(StatusCode::CREATED))
}

/// GET /api/v1/reviews/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let review = state.resources.reviews.get_one(&id).await?;
    Ok(ApiResponse::document("review", review))
}

/// PATCH /api/v1/reviews/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    ensure_owner(&state, &me, &id).await?;
    let review = state.resources.reviews.update(&id, body, me.actor()).await?;
    Ok(ApiResponse::document("review", review))
}

/// DELETE /api/v1/reviews/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    ensure_owner(&state, &me, &id).await?;
    state.resources.reviews.delete(&id, me.actor()).await?;
    Ok(ApiResponse::no_content())
}

/// Admins may change any review, everyone else only their own
async fn ensure_owner(state: &AppState, me: &Identity, id: &str) -> Result<(), ApiError> {
    if me.is(Role::Admin) {
        return Ok(());
    }

    let reviews = &state.resources.reviews;
    let review = reviews
        .find_raw_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(reviews.schema().not_found(id)))?;

    if review.get("user").and_then(Value::as_str) != Some(me.id.as_str()) {
        tracing::debug!("{} tried to modify review {} owned by someone else", me.id, id);
        return Err(ApiError::forbidden(NOT_OWNER));
    }
    Ok(())
}
