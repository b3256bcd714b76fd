use axum::extract::{Extension, Path, State};
use serde_json::{json, Value};

use super::{values, ListQuery};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, RequestTime};
use crate::models::PASSWORD_FIELDS;
use crate::types::{Actor, Document};

/// Fields a user may change on their own account
const SELF_SERVICE_FIELDS: &[&str] = &["name", "email"];

/// GET /api/v1/users/me
pub async fn me(State(state): State<AppState>, CurrentUser(me): CurrentUser) -> ApiResult<Value> {
    let user = state.resources.users.get_one(&me.id).await?;
    Ok(ApiResponse::document("user", user))
}

/// PATCH /api/v1/users/update-my-data
pub async fn update_my_data(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    if PASSWORD_FIELDS.iter().any(|field| body.contains_key(*field)) {
        return Err(ApiError::bad_request(
            "This route is not for password updates. Please use /update-my-password.",
        ));
    }

    let changes: Document = body
        .into_iter()
        .filter(|(key, _)| SELF_SERVICE_FIELDS.contains(&key.as_str()))
        .collect();

    let user = state.resources.users.update(&me.id, changes, me.actor()).await?;
    Ok(ApiResponse::document("user", user))
}

/// DELETE /api/v1/users/deactivate-account
pub async fn deactivate_account(State(state): State<AppState>, CurrentUser(me): CurrentUser) -> ApiResult<Value> {
    let mut changes = Document::new();
    changes.insert("isActive".into(), json!(false));
    state.resources.users.update(&me.id, changes, Actor::System).await?;
    tracing::info!("User {} deactivated their account", me.id);
    Ok(ApiResponse::no_content())
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    query: ListQuery,
) -> ApiResult<Value> {
    let users = state.resources.users.list(&query.0, &Filter::new()).await?;
    Ok(ApiResponse::list("users", values(users), &at))
}

/// GET /api/v1/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let user = state.resources.users.get_one(&id).await?;
    Ok(ApiResponse::document("user", user))
}

/// PATCH /api/v1/users/:id - password fields are ignored here
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let user = state.resources.users.update(&id, body, me.actor()).await?;
    Ok(ApiResponse::document("user", user))
}

/// DELETE /api/v1/users/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    state.resources.users.delete(&id, me.actor()).await?;
    Ok(ApiResponse::no_content())
}
