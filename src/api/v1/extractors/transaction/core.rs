use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::TransactionCtx;

/// Extractor for `TransactionCtx`.
///
/// Relies on the request gate having inserted it. A missing context means the
/// route is not behind the gate (or is not a POST), which is a wiring bug.
pub struct TransactionCtxExtractor(pub TransactionCtx);

impl<S> FromRequestParts<S> for TransactionCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TransactionCtx>()
            .cloned()
            .map(TransactionCtxExtractor)
            .ok_or(AppError::Internal)
    }
}
