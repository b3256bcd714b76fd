use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::request::Parts,
};

use crate::error::ApiError;

/// Raw query-string parameters for list routes; rejections become `ApiError::BadRequest`
pub struct ListQuery(pub HashMap<String, String>);

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(rejected)?;
        Ok(ListQuery(params))
    }
}

fn rejected(rejection: QueryRejection) -> ApiError {
    tracing::debug!("Rejected query string: {}", rejection.body_text());
    ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text()))
}
