//! Account routes: signup, login, logout and the password flows.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde_json::{json, Value};
use url::Url;

use crate::app::AppState;
use crate::auth::cookie::{logout_cookie, token_cookie};
use crate::auth::{CurrentUser, ResetToken};
use crate::error::ApiError;
use crate::filter::{Filter, FilterOp};
use crate::middleware::{ApiResponse, JsonBody};
use crate::types::{format_instant, now_string, Actor, Document};

const MISSING_CREDENTIALS: &str = "Please provide email and password!";
const BAD_CREDENTIALS: &str = "Incorrect email or password";
const UNKNOWN_EMAIL: &str = "There is no user with this email address.";
const MAIL_FAILED: &str = "There was an error sending the email. Try again later!";
const BAD_RESET_TOKEN: &str = "Token is invalid or has expired";
const WRONG_PASSWORD: &str = "Your current password is wrong.";

fn text<'a>(body: &'a Document, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn with_cookie(response: Response, cookie: Cookie<'static>) -> Response {
    (CookieJar::new().add(cookie), response).into_response()
}

/// Issue a token for `user`: cookie plus `{status, token, data: {user}}`
fn send_token(state: &AppState, user: Document, status: StatusCode) -> Result<Response, ApiError> {
    let id = user
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::internal("user document without id"))?;
    let token = state.tokens.sign(id)?;

    let security = &state.config.security;
    let cookie = token_cookie(&token, security.jwt_cookie_expires_days, state.config.environment.is_production());

    let user = state.resources.users.shape(user);
    let response = ApiResponse::with_status(json!({ "user": user }), status)
        .meta("token", token)
        .into_response();
    Ok(with_cookie(response, cookie))
}

/// POST /api/v1/users/signup
pub async fn signup(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<Response, ApiError> {
    let user = state.resources.users.create(body, Actor::Anonymous).await?;
    send_token(&state, user, StatusCode::CREATED)
}

/// POST /api/v1/users/login
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (text(&body, "email"), text(&body, "password")) else {
        return Err(ApiError::bad_request(MISSING_CREDENTIALS));
    };

    let user = state
        .resources
        .users
        .find_raw(&Filter::eq("email", email.trim().to_lowercase()))
        .await?;

    let hash = user.as_ref().and_then(|u| text(u, "password")).unwrap_or_default();
    let verified = !hash.is_empty() && state.passwords.verify(password, hash).await?;

    match user {
        Some(user) if verified => send_token(&state, user, StatusCode::OK),
        _ => {
            tracing::debug!("Failed login for {}", email);
            Err(ApiError::unauthenticated(BAD_CREDENTIALS))
        }
    }
}

/// GET /api/v1/users/logout
pub async fn logout() -> Response {
    with_cookie(ApiResponse::success(Value::Null).into_response(), logout_cookie())
}

/// POST /api/v1/users/forgot-password
pub async fn forgot_password(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<Response, ApiError> {
    let users = &state.resources.users;
    let email = text(&body, "email").map(|e| e.trim().to_lowercase()).unwrap_or_default();
    let user = users
        .find_raw(&Filter::eq("email", email.clone()))
        .await?
        .ok_or_else(|| ApiError::not_found(UNKNOWN_EMAIL))?;
    let id = text(&user, "id").unwrap_or_default().to_string();
    let name = text(&user, "name").unwrap_or_default().to_string();

    let reset = ResetToken::generate();
    let expires = Utc::now() + chrono::Duration::from_std(state.config.security.password_reset_ttl)
        .map_err(|e| ApiError::internal(format!("reset ttl: {}", e)))?;

    let mut changes = Document::new();
    changes.insert("passwordResetToken".into(), json!(reset.digest));
    changes.insert("passwordResetExpires".into(), json!(format_instant(expires)));
    users.update(&id, changes, Actor::System).await?;

    let url = Url::parse(&state.config.server.public_url)
        .and_then(|base| base.join(&format!("/api/v1/users/reset-password/{}", reset.plain)))
        .map_err(|e| ApiError::internal(format!("reset url: {}", e)))?;

    if let Err(e) = state.mailer.send_password_reset(&email, &name, url.as_str()).await {
        tracing::error!("Password reset mail to {} failed: {}", email, e);
        let mut clear = Document::new();
        clear.insert("passwordResetToken".into(), Value::Null);
        clear.insert("passwordResetExpires".into(), Value::Null);
        users.update(&id, clear, Actor::System).await?;
        return Err(ApiError::operational(StatusCode::INTERNAL_SERVER_ERROR, MAIL_FAILED));
    }

    Ok(ApiResponse::success(Value::Null)
        .meta("message", "Token sent to email!")
        .into_response())
}

/// PATCH /api/v1/users/reset-password/:token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let users = &state.resources.users;
    let filter = Filter::eq("passwordResetToken", ResetToken::digest(&token))
        .and("passwordResetExpires", FilterOp::Gt, now_string());
    let user = users
        .find_raw(&filter)
        .await?
        .ok_or_else(|| ApiError::bad_request(BAD_RESET_TOKEN))?;
    let id = text(&user, "id").unwrap_or_default().to_string();

    let mut changes = Document::new();
    for field in ["password", "passwordConfirm"] {
        changes.insert(field.into(), body.get(field).cloned().unwrap_or(Value::Null));
    }
    changes.insert("passwordResetToken".into(), Value::Null);
    changes.insert("passwordResetExpires".into(), Value::Null);

    let user = users.update(&id, changes, Actor::System).await?;
    tracing::info!("User {} reset their password", id);
    send_token(&state, user, StatusCode::OK)
}

/// PATCH /api/v1/users/update-my-password
pub async fn update_my_password(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    let (Some(current), Some(new), Some(confirm)) = (
        text(&body, "currentPassword"),
        text(&body, "newPassword"),
        text(&body, "newPasswordConfirm"),
    ) else {
        return Err(ApiError::bad_request(
            "Please provide currentPassword, newPassword and newPasswordConfirm",
        ));
    };

    let users = &state.resources.users;
    let user = users
        .find_raw_by_id(&me.id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated(crate::auth::USER_GONE))?;
    let hash = text(&user, "password").unwrap_or_default();
    if hash.is_empty() || !state.passwords.verify(current, hash).await? {
        return Err(ApiError::unauthenticated(WRONG_PASSWORD));
    }

    let mut changes = Document::new();
    changes.insert("password".into(), json!(new));
    changes.insert("passwordConfirm".into(), json!(confirm));
    let user = users.update(&me.id, changes, Actor::System).await?;
    send_token(&state, user, StatusCode::OK)
}
