use axum::extract::{Extension, Path, State};
use serde_json::Value;

use super::{values, ListQuery};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::filter::QuerySpec;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, RequestTime};
use crate::services::geo::{self, Point, Unit};
use crate::services::tour_stats;
use crate::types::Document;

/// GET /api/v1/tours
pub async fn list(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    query: ListQuery,
) -> ApiResult<Value> {
    let tours = state.resources.tours.list(&query.0, &Default::default()).await?;
    Ok(ApiResponse::list("tours", values(tours), &at))
}

/// GET /api/v1/tours/top-5-cheap - list preset, caller parameters overridden
pub async fn top_five_cheap(
    state: State<AppState>,
    request_time: Extension<RequestTime>,
    mut query: ListQuery,
) -> ApiResult<Value> {
    for (key, value) in [
        ("limit", "5"),
        ("sort", "-ratingsAverage,price"),
        ("fields", "name,price,ratingsAverage,summary,difficulty"),
    ] {
        query.0.insert(key.to_string(), value.to_string());
    }
    list(state, request_time, query).await
}

/// GET /api/v1/tours/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let tour = state.resources.tours.get_one(&id).await?;
    Ok(ApiResponse::document("tour", tour))
}

/// POST /api/v1/tours
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let tour = state.resources.tours.create(body, me.actor()).await?;
    Ok(ApiResponse::document("tour", tour).status(axum::http::StatusCode::CREATED))
}

/// PATCH /api/v1/tours/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let tour = state.resources.tours.update(&id, body, me.actor()).await?;
    Ok(ApiResponse::document("tour", tour))
}

/// DELETE /api/v1/tours/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    state.resources.tours.delete(&id, me.actor()).await?;
    Ok(ApiResponse::no_content())
}

async fn all_tours(state: &AppState) -> Result<Vec<Document>, ApiError> {
    let schema = state.resources.tours.schema();
    Ok(state
        .store
        .find(&schema.collection, &QuerySpec::all(schema.scope.clone()))
        .await?)
}

/// GET /api/v1/tours/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Value> {
    let tours = all_tours(&state).await?;
    Ok(ApiResponse::document("stats", tour_stats::stats(&tours)))
}

/// GET /api/v1/tours/monthly-plan/:year
pub async fn monthly_plan(State(state): State<AppState>, Path(year): Path<String>) -> ApiResult<Value> {
    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid year: {}", year)))?;
    let tours = all_tours(&state).await?;
    Ok(ApiResponse::document("plan", tour_stats::monthly_plan(&tours, year)))
}

/// GET /api/v1/tours/tours-within/:distance/center/:latlng/unit/:unit
pub async fn within(
    State(state): State<AppState>,
    Extension(RequestTime(at)): Extension<RequestTime>,
    Path((distance, latlng, unit)): Path<(String, String, String)>,
) -> ApiResult<Value> {
    let center = Point::parse(&latlng)?;
    let distance: f64 = distance
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid distance: {}", distance)))?;

    let tours = geo::within(all_tours(&state).await?, center, distance, Unit::parse(&unit));
    let shaped = tours.into_iter().map(|t| state.resources.tours.shape(t)).collect();
    Ok(ApiResponse::list("tours", values(shaped), &at))
}

/// GET /api/v1/tours/distances/:latlng/unit/:unit
pub async fn distances(
    State(state): State<AppState>,
    Path((latlng, unit)): Path<(String, String)>,
) -> ApiResult<Value> {
    let from = Point::parse(&latlng)?;
    let tours = all_tours(&state).await?;
    Ok(ApiResponse::document("distances", geo::distances(&tours, from, Unit::parse(&unit))))
}
