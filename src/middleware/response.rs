use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that adds the `{status: "success"}` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    /// Extra top-level envelope fields (`results`, `requestedAt`, `token`)
    pub meta: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
            meta: Map::new(),
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code: Some(status_code),
            meta: Map::new(),
        }
    }

    pub fn status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

impl ApiResponse<Value> {
    /// List envelope: `results` and `requestedAt` beside `data`
    pub fn list(key: &str, items: Vec<Value>, requested_at: &str) -> Self {
        let results = items.len();
        Self::success(keyed(key, Value::Array(items)))
            .meta("requestedAt", requested_at)
            .meta("results", results)
    }

    /// Single document under `data.<key>`
    pub fn document(key: &str, doc: impl Into<Value>) -> Self {
        Self::success(keyed(key, doc.into()))
    }

    /// Create a 204 No Content response (data will be ignored)
    pub fn no_content() -> Self {
        Self::with_status(Value::Null, StatusCode::NO_CONTENT)
    }
}

fn keyed(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // For 204 No Content, return empty response
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "error",
                        "message": "Something went wrong!"
                    })),
                )
                    .into_response();
            }
        };

        let mut envelope = Map::new();
        envelope.insert("status".to_string(), json!("success"));
        envelope.extend(self.meta);
        if !data_value.is_null() {
            envelope.insert("data".to_string(), data_value);
        }

        (status, Json(Value::Object(envelope))).into_response()
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
