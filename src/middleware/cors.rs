//! CORS for browser callers of the gated API.
//!
//! Browsers only send the `token` header cross-origin if the preflight lists it,
//! so the allowed request headers are the ones the gate reads plus the ones the
//! HTTP layer correlates on. Methods are the ones `/api/v1` serves.
//!
//! - Development: any origin.
//! - Production: exact-match `CORS_ALLOWED_ORIGINS`; an empty list allows none.
//!
//! Credentials are never allowed: the token travels in a header, not a cookie.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;
use crate::middleware::request_gate::TOKEN_HEADER;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(cors_layer(config))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        AllowOrigin::predicate(move |origin: &HeaderValue, _| allowed.contains(origin))
    } else {
        AllowOrigin::from(Any)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            HeaderName::from_static(TOKEN_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
            header::CONTENT_TYPE,
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(PREFLIGHT_MAX_AGE)
}
