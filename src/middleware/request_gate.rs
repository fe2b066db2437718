//! Request validation gate for `/api/v1/*`.
//!
//! Per request, in order (first failure wins):
//! 1. `token` header present and not blank (raw bytes; encoding problems are left to decode)
//! 2. base64 decode
//! 3. split into exactly 3 fields
//! 4. timestamp within the freshness window
//! 5. service id known to the allow-list
//! 6. POST only: attach `TransactionCtx` to the request extensions
//!
//! A rejection ends the request with HTTP 200 + `{"statusCode", "message"}`;
//! downstream handlers never run.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::api::v1::extractors::TransactionCtx;
use crate::error::GateError;
use crate::services::service_ids::ServiceIdCache;
use crate::services::token::TokenCodec;
use crate::state::AppState;

pub const TOKEN_HEADER: &str = "token";

/// Result of running a request through the gate.
#[derive(Debug)]
pub enum Outcome {
    /// Pass on to the next stage (possibly carrying a `TransactionCtx`).
    Forward(Request<Body>),
    Reject(GateError),
}

#[derive(Clone)]
pub struct RequestGate {
    codec: TokenCodec,
    service_ids: Arc<dyn ServiceIdCache>,
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl RequestGate {
    pub fn new(codec: TokenCodec, service_ids: Arc<dyn ServiceIdCache>) -> Self {
        Self { codec, service_ids }
    }

    pub fn process(&self, req: Request<Body>) -> Outcome {
        self.process_at(req, Utc::now().timestamp_millis())
    }

    /// Same as `process`, with an explicit clock (epoch millis).
    pub fn process_at(&self, mut req: Request<Body>, now_millis: i64) -> Outcome {
        tracing::info!(
            method = %req.method(),
            uri = %req.uri(),
            "request validation started"
        );

        match self.validate(req.headers(), req.method(), now_millis) {
            Ok(transaction) => {
                if let Some(ctx) = transaction {
                    req.extensions_mut().insert(ctx);
                }
                tracing::info!(uri = %req.uri(), "request validation passed");
                Outcome::Forward(req)
            }
            Err(err) => {
                tracing::warn!(
                    kind = err.kind(),
                    error = ?err,
                    uri = %req.uri(),
                    "request rejected"
                );
                Outcome::Reject(err)
            }
        }
    }

    fn validate(
        &self,
        headers: &HeaderMap,
        method: &Method,
        now_millis: i64,
    ) -> Result<Option<TransactionCtx>, GateError> {
        let raw = headers
            .get(TOKEN_HEADER)
            .map(|v| v.as_bytes().trim_ascii())
            .filter(|v| !v.is_empty())
            .ok_or(GateError::InvalidTokenHeader)?;

        let decoded = self.codec.decode(raw)?;
        let fields = self.codec.parse(&decoded);
        self.codec.validate_field_count(&fields)?;
        self.codec.validate_timestamp(&fields, now_millis)?;

        let service_id = self.codec.service_id(&fields)?;
        if !self.service_ids.exists(service_id) {
            return Err(GateError::UnknownServiceIdentity);
        }

        if *method == Method::POST {
            let transaction_id = self.codec.transaction_id(&fields)?;
            return Ok(Some(TransactionCtx::new(transaction_id)));
        }

        Ok(None)
    }
}

/// Put the gate in front of every route of `router`.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::request_gate::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, request_gate_middleware))
}

async fn request_gate_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match state.gate.process(req) {
        Outcome::Forward(req) => next.run(req).await,
        Outcome::Reject(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::{StatusCode, header};
    use axum::routing::any;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use tower::ServiceExt;

    use crate::error::{BaseResponse, ResultCode};
    use crate::services::service_ids::InMemoryServiceIdCache;
    use crate::services::token::{TokenError, TokenPolicy};

    const NOW: i64 = 1_760_000_000_000;
    const SKEW: i64 = 60_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenPolicy {
            max_skew_millis: SKEW,
        })
    }

    fn state(ids: &[&str]) -> AppState {
        let cache = Arc::new(InMemoryServiceIdCache::new(ids.iter().copied()));
        let gate = RequestGate::new(codec(), cache.clone());
        AppState::new(Arc::new(gate), cache)
    }

    fn token(service_id: &str, transaction_id: &str, ts: i64) -> String {
        codec().encode(service_id, transaction_id, ts).unwrap()
    }

    fn request(method: Method, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/echo");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn rejected(outcome: Outcome) -> GateError {
        match outcome {
            Outcome::Reject(err) => err,
            Outcome::Forward(_) => panic!("expected rejection"),
        }
    }

    fn forwarded(outcome: Outcome) -> Request<Body> {
        match outcome {
            Outcome::Forward(req) => req,
            Outcome::Reject(err) => panic!("expected forward, got {err:?}"),
        }
    }

    #[test]
    fn missing_or_blank_header_is_invalid_token_header() {
        let state = state(&["svc-42"]);

        for value in [None, Some(""), Some("   "), Some("\t")] {
            let outcome = state.gate.process_at(request(Method::GET, value), NOW);
            assert_eq!(rejected(outcome), GateError::InvalidTokenHeader);
        }
    }

    #[test]
    fn non_ascii_header_is_a_decode_error() {
        let state = state(&["svc-42"]);

        for bytes in [&b"abc\xe9"[..], &b"\xfa\xfb"[..]] {
            let req = Request::builder()
                .uri("/echo")
                .header(TOKEN_HEADER, header::HeaderValue::from_bytes(bytes).unwrap())
                .body(Body::empty())
                .unwrap();

            assert_eq!(
                rejected(state.gate.process_at(req, NOW)),
                GateError::TokenDecodeError(TokenError::InvalidEncoding)
            );
        }
    }

    #[test]
    fn undecodable_token_is_decode_error() {
        let state = state(&["svc-42"]);

        let err = rejected(state.gate.process_at(request(Method::GET, Some("%%%")), NOW));
        assert_eq!(err, GateError::TokenDecodeError(TokenError::InvalidEncoding));
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let state = state(&["svc-42"]);

        for plain in ["svc-42|txn-1", "svc-42|txn-1|1|extra", "svc-42"] {
            let raw = STANDARD.encode(plain);
            let err = rejected(state.gate.process_at(request(Method::GET, Some(raw.as_str())), NOW));
            assert_eq!(err.result_code(), ResultCode::TokenFieldCount, "{plain}");
        }
    }

    #[test]
    fn stale_and_unparsable_timestamps_are_rejected() {
        let state = state(&["svc-42"]);

        let stale = token("svc-42", "txn-1", NOW - SKEW - 1);
        let err = rejected(state.gate.process_at(request(Method::GET, Some(stale.as_str())), NOW));
        assert_eq!(err.result_code(), ResultCode::TokenTimestamp);

        let garbage = STANDARD.encode("svc-42|txn-1|noon");
        let err = rejected(state.gate.process_at(request(Method::GET, Some(garbage.as_str())), NOW));
        assert_eq!(err.result_code(), ResultCode::TokenTimestamp);
    }

    #[test]
    fn fresh_timestamp_passes_the_window_check() {
        let state = state(&["svc-42"]);
        let fresh = token("svc-42", "txn-1", NOW - SKEW);

        forwarded(state.gate.process_at(request(Method::GET, Some(fresh.as_str())), NOW));
    }

    #[test]
    fn unknown_service_is_rejected() {
        let state = state(&["other"]);
        let raw = token("svc-42", "txn-1", NOW);

        assert_eq!(
            rejected(state.gate.process_at(request(Method::POST, Some(raw.as_str())), NOW)),
            GateError::UnknownServiceIdentity
        );
    }

    #[test]
    fn field_checks_run_before_the_service_lookup() {
        // Unknown service AND stale timestamp: the timestamp failure is reported.
        let state = state(&[]);
        let raw = token("svc-42", "txn-1", NOW - 10 * SKEW);

        assert_eq!(
            rejected(state.gate.process_at(request(Method::GET, Some(raw.as_str())), NOW)).result_code(),
            ResultCode::TokenTimestamp
        );
    }

    #[test]
    fn post_forwards_with_transaction_ctx() {
        let state = state(&["svc-42"]);
        let raw = token("svc-42", "txn-1", NOW);

        let req = forwarded(state.gate.process_at(request(Method::POST, Some(raw.as_str())), NOW));

        assert_eq!(
            req.extensions().get::<TransactionCtx>(),
            Some(&TransactionCtx::new("txn-1"))
        );
        assert_eq!(req.headers()[TOKEN_HEADER], raw.as_str());
        assert_eq!(req.uri(), "/echo");
    }

    #[test]
    fn non_post_forwards_without_transaction_ctx() {
        let state = state(&["svc-42"]);

        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let raw = token("svc-42", "", NOW);
            let req = forwarded(state.gate.process_at(request(method, Some(raw.as_str())), NOW));
            assert!(req.extensions().get::<TransactionCtx>().is_none());
        }
    }

    /// Router with a spy downstream that counts calls and echoes the transaction id.
    fn spy_app(state: AppState) -> (Router, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let spy = Arc::clone(&hits);

        let downstream = Router::new().route(
            "/echo",
            any(move |req: Request<Body>| {
                let spy = Arc::clone(&spy);
                async move {
                    spy.fetch_add(1, Ordering::SeqCst);
                    req.extensions()
                        .get::<TransactionCtx>()
                        .map(|ctx| ctx.transaction_id.clone())
                        .unwrap_or_else(|| "<none>".to_string())
                }
            }),
        );

        let app = apply(downstream, state.clone()).with_state(state);
        (app, hits)
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    #[tokio::test]
    async fn valid_post_reaches_downstream_with_transaction_id() {
        let (app, hits) = spy_app(state(&["svc-42"]));
        let raw = token("svc-42", "txn-1", now());

        let res = app
            .oneshot(request(Method::POST, Some(raw.as_str())))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "txn-1");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn valid_get_reaches_downstream_without_transaction_id() {
        let (app, hits) = spy_app(state(&["svc-42"]));
        let raw = token("svc-42", "txn-1", now());

        let res = app
            .oneshot(request(Method::GET, Some(raw.as_str())))
            .await
            .unwrap();

        assert_eq!(body_text(res).await, "<none>");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejections_never_invoke_downstream() {
        let stale = token("svc-42", "txn-1", now() - 10 * SKEW);
        let unknown = token("svc-99", "txn-1", now());
        let short = STANDARD.encode("svc-42|txn-1");

        let cases: [(Option<&str>, u16); 5] = [
            (None, 4001),
            (Some("not-base64!"), 4002),
            (Some(short.as_str()), 4003),
            (Some(stale.as_str()), 4004),
            (Some(unknown.as_str()), 4005),
        ];

        for (token, expected) in cases {
            let (app, hits) = spy_app(state(&["svc-42"]));

            let res = app.oneshot(request(Method::POST, token)).await.unwrap();

            assert_eq!(res.status(), StatusCode::OK);
            assert!(
                res.headers()[header::CONTENT_TYPE]
                    .to_str()
                    .unwrap()
                    .starts_with("application/json")
            );

            let body: BaseResponse = serde_json::from_str(&body_text(res).await).unwrap();
            assert_eq!(body.status_code, expected);
            assert!(!body.message.is_empty());
            assert_eq!(hits.load(Ordering::SeqCst), 0, "case {expected}");
        }
    }

    #[tokio::test]
    async fn same_token_is_rejected_once_service_leaves_the_cache() {
        let state = state(&["svc-42"]);
        let raw = token("svc-42", "txn-1", now());

        let (app, _) = spy_app(state.clone());
        let res = app
            .oneshot(request(Method::POST, Some(raw.as_str())))
            .await
            .unwrap();
        assert_eq!(body_text(res).await, "txn-1");

        state.service_ids.replace_all(Default::default());

        let (app, hits) = spy_app(state);
        let res = app
            .oneshot(request(Method::POST, Some(raw.as_str())))
            .await
            .unwrap();
        let body: BaseResponse = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(body.status_code, ResultCode::UnknownService.code());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
