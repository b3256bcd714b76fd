use axum::{extract::Request, middleware::Next, response::Response};

use crate::types::now_string;

/// Timestamp captured when the request entered the router
#[derive(Debug, Clone)]
pub struct RequestTime(pub String);

pub async fn request_time_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestTime(now_string()));
    next.run(request).await
}
