use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::{Duration, OffsetDateTime};

pub const TOKEN_COOKIE: &str = "jwt";
pub const LOGGED_OUT: &str = "loggedout";

/// Cookie carrying a fresh token
pub fn token_cookie(token: &str, days: i64, secure: bool) -> Cookie<'static> {
    build(token.to_string(), OffsetDateTime::now_utc() + Duration::days(days), secure)
}

/// Overwrites the token cookie with a placeholder that expires in 10 seconds
pub fn logout_cookie() -> Cookie<'static> {
    build(LOGGED_OUT.to_string(), OffsetDateTime::now_utc() + Duration::seconds(10), false)
}

fn build(value: String, expires: OffsetDateTime, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .expires(expires)
        .build()
}

/// Token from the request cookies, unless it is the logout placeholder
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| token != LOGGED_OUT && !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie("abc", 90, true);
        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.expires_datetime().is_some_and(|at| at > OffsetDateTime::now_utc() + Duration::days(89)));

        let header = token_cookie("abc", 90, false).to_string();
        assert!(header.starts_with("jwt=abc"));
        assert!(header.contains("HttpOnly"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_logout_cookie_expires_soon() {
        let cookie = logout_cookie();
        assert_eq!(cookie.value(), LOGGED_OUT);
        assert!(cookie.expires_datetime().is_some_and(|at| at <= OffsetDateTime::now_utc() + Duration::seconds(10)));
    }

    #[test]
    fn test_read_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; jwt=tok.en.value"));
        assert_eq!(read_token(&headers), Some("tok.en.value".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt=loggedout"));
        assert_eq!(read_token(&headers), None);
        assert_eq!(read_token(&HeaderMap::new()), None);
    }
}
