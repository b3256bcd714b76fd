use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::types::Document;

/// JSON object body; rejections become `ApiError::InvalidJson`
pub struct JsonBody(pub Document);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(request, state)
            .await
            .map_err(|rejection: JsonRejection| {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                ApiError::invalid_json(format!("Invalid JSON body: {}", rejection.body_text()))
            })?;

        match value {
            Value::Object(doc) => Ok(JsonBody(doc)),
            _ => Err(ApiError::invalid_json("Request body must be a JSON object")),
        }
    }
}
