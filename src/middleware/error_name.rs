use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::ErrorCode;

pub const ERROR_NAME_HEADER: HeaderName = HeaderName::from_static("x-error-name");

/// Development only: expose the error kind of failed responses as a header
pub async fn error_name_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Some(ErrorCode(code)) = response.extensions().get::<ErrorCode>().copied() {
        response
            .headers_mut()
            .insert(ERROR_NAME_HEADER, HeaderValue::from_static(code));
    }
    response
}
