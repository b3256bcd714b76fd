//! Router-wide HTTP layers: tracing, CORS, security headers, body limit.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;

pub fn apply(router: Router, config: &AppConfig) -> Router {
    // Body limit applied as its own router layer (still innermost) so CORS
    // sees axum's `Body`, which implements `Default` as `Cors` requires.
    security_headers(router)
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(config)),
        )
}

/// Development allows any origin; otherwise only the configured ones
fn cors(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    let layer = if config.environment.is_development() || origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    };

    layer
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(60 * 10))
}

fn security_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ))
}
