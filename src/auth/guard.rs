//! Auth guard middleware.
//!
//! `protect` resolves the caller from a bearer token or the `jwt` cookie and
//! inserts an [`Identity`] into the request extensions; `restrict_to` checks
//! that identity's role. Handlers read it back through [`CurrentUser`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;

use super::cookie::read_token;
use super::{NOT_LOGGED_IN, NO_PERMISSION, PASSWORD_CHANGED, USER_GONE};
use crate::app::AppState;
use crate::error::ApiError;
use crate::types::{parse_instant, Actor, Document, Role};

/// The authenticated caller, valid for one request
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let text = |field: &str| doc.get(field).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            id: text("id")?,
            name: text("name").unwrap_or_default(),
            email: text("email").unwrap_or_default(),
            role: text("role").and_then(|r| Role::parse(&r)).unwrap_or(Role::User),
        })
    }

    pub fn actor(&self) -> Actor {
        Actor::User { id: self.id.clone(), role: self.role }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Bearer header first, then the cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| read_token(headers))
}

/// Whether the password changed after the token was issued
fn changed_password_after(user: &Document, issued_at: i64) -> bool {
    user.get("passwordChangedAt")
        .and_then(Value::as_str)
        .and_then(parse_instant)
        .map(|changed| changed.timestamp() > issued_at)
        .unwrap_or(false)
}

pub async fn protect(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::debug!("Rejected {}: no token", request.uri().path());
        ApiError::unauthenticated(NOT_LOGGED_IN)
    })?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::from(e)
    })?;

    let user = match state.resources.users.find_raw_by_id(&claims.id).await {
        Ok(user) => user,
        Err(ApiError::BadRequest(_)) => None,
        Err(e) => return Err(e),
    };
    let user = user.ok_or_else(|| ApiError::unauthenticated(USER_GONE))?;

    if changed_password_after(&user, claims.iat) {
        tracing::debug!("Rejected token for {}: password changed since issue", claims.id);
        return Err(ApiError::unauthenticated(PASSWORD_CHANGED));
    }

    let identity = Identity::from_document(&user).ok_or_else(|| ApiError::unauthenticated(USER_GONE))?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Use with `middleware::from_fn_with_state(ROLES, restrict_to)` inside `protect`
pub async fn restrict_to(State(roles): State<&'static [Role]>, request: Request, next: Next) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))?;

    if !roles.contains(&identity.role) {
        tracing::debug!("{} ({}) denied {}", identity.id, identity.role, request.uri().path());
        return Err(ApiError::forbidden(NO_PERMISSION));
    }
    Ok(next.run(request).await)
}

/// Extractor for the identity `protect` resolved
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthenticated(NOT_LOGGED_IN))
    }
}
