// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationFailure(Vec<String>),
    DuplicateKey(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthenticated(String),
    MalformedToken(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // Expected business failure carrying its own status
    Operational { status: StatusCode, message: String },

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateKey(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::MalformedToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Operational { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationFailure(messages) => {
                format!("Invalid input data: {}", messages.join(". "))
            }
            ApiError::DuplicateKey(field) => {
                format!("Duplicate field value: {}. Please use another value!", field)
            }
            // Internal detail never reaches the client
            ApiError::Internal(_) => "Something went wrong!".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::MalformedToken(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Operational { message: msg, .. } => msg.clone(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationFailure(_) => "VALIDATION_ERROR",
            ApiError::DuplicateKey(_) => "DUPLICATE_KEY",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::MalformedToken(_) => "MALFORMED_TOKEN",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Operational { .. } => "OPERATIONAL_ERROR",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// `fail` for client errors, `error` for server errors
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_server_error() {
            "error"
        } else {
            "fail"
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status_label(),
            "message": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationFailure(vec![message.into()])
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn malformed_token(message: impl Into<String>) -> Self {
        ApiError::MalformedToken(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn operational(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Operational {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::filter::FilterError> for ApiError {
    fn from(err: crate::filter::FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        use crate::store::StoreError;

        match err {
            StoreError::Duplicate { field } => ApiError::DuplicateKey(field),
            StoreError::InvalidId(id) => ApiError::bad_request(format!("Invalid id: {}", id)),
            // Logged by IntoResponse, never shown to clients
            StoreError::Sqlx(e) => ApiError::internal(format!("sqlx: {}", e)),
        }
    }
}

impl From<crate::observer::ObserverError> for ApiError {
    fn from(err: crate::observer::ObserverError) -> Self {
        use crate::observer::ObserverError;

        match err {
            ObserverError::Validation(messages) => ApiError::ValidationFailure(messages),
            ObserverError::Store(e) => e.into(),
            ObserverError::System(msg) => ApiError::internal(format!("observer: {}", msg)),
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        use crate::auth::TokenError;

        match err {
            TokenError::Expired => {
                ApiError::malformed_token("Your token has expired! Please log in again.")
            }
            TokenError::Invalid(reason) => {
                tracing::debug!("Rejected token: {}", reason);
                ApiError::malformed_token("Invalid token! Please log in again.")
            }
            TokenError::Signing(reason) => ApiError::internal(reason),
        }
    }
}

impl From<crate::auth::PasswordError> for ApiError {
    fn from(err: crate::auth::PasswordError) -> Self {
        ApiError::internal(format!("password hashing: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Internal(detail) => write!(f, "internal error: {}", detail),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!("Unhandled error: {}", detail);
        }

        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        response.extensions_mut().insert(ErrorCode(self.error_code()));
        response
    }
}

/// Error code recorded on error responses for request tracing
#[derive(Debug, Clone, Copy)]
pub struct ErrorCode(pub &'static str);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_fail_and_server_errors_are_error() {
        assert_eq!(ApiError::not_found("x").status_label(), "fail");
        assert_eq!(ApiError::forbidden("x").status_label(), "fail");
        assert_eq!(ApiError::internal("x").status_label(), "error");
    }

    #[test]
    fn internal_detail_is_hidden_from_clients() {
        let err = ApiError::internal("connection refused on 10.0.0.3");
        assert_eq!(err.to_json()["message"], "Something went wrong!");
    }

    #[test]
    fn validation_messages_are_joined() {
        let err = ApiError::ValidationFailure(vec![
            "A tour must have a price".into(),
            "A tour must have a summary".into(),
        ]);
        assert_eq!(
            err.message(),
            "Invalid input data: A tour must have a price. A tour must have a summary"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_key_names_the_field() {
        let err = ApiError::DuplicateKey("email".into());
        assert!(err.message().contains("email"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
