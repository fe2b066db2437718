/*
 * Responsibility
 * - GET/POST /api/v1/echo: smallest downstream consumers of the gate
 * - POST shows how a handler reads the transaction id the gate attached
 */
use crate::{
    api::v1::extractors::TransactionCtxExtractor,
    error::{BaseResponse, ResultCode},
};

pub async fn echo_get() -> BaseResponse {
    BaseResponse::new(ResultCode::Success, "ok")
}

pub async fn echo_post(TransactionCtxExtractor(ctx): TransactionCtxExtractor) -> BaseResponse {
    tracing::info!(transaction_id = %ctx.transaction_id, "echo accepted");

    BaseResponse::new(ResultCode::Success, "accepted").with_transaction_id(ctx.transaction_id)
}
