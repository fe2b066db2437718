/*
 * Responsibility
 * - AppError: infrastructure / handler errors (real HTTP status + JSON error body)
 * - GateError: request rejections from the validation gate
 *   - always HTTP 200, the outcome is carried in `statusCode` of the body
 * - BaseResponse: body shared by gate rejections and downstream success responses
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::cache::CacheError;
use crate::services::token::TokenError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Everything here is a server-side problem; details stay in the logs.
        tracing::error!(error = %self, "request failed");

        let body = ErrorResponse {
            error: ErrorBody {
                code: "INTERNAL_SERVER_ERROR",
                message: "internal server error".into(),
            },
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Machine-readable outcome carried in `BaseResponse.statusCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    InvalidTokenHeader,
    TokenDecodeError,
    TokenFieldCount,
    TokenTimestamp,
    UnknownService,
}

impl ResultCode {
    pub fn code(self) -> u16 {
        match self {
            ResultCode::Success => 2000,
            ResultCode::InvalidTokenHeader => 4001,
            ResultCode::TokenDecodeError => 4002,
            ResultCode::TokenFieldCount => 4003,
            ResultCode::TokenTimestamp => 4004,
            ResultCode::UnknownService => 4005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl BaseResponse {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.code(),
            message: message.into(),
            transaction_id: None,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

impl IntoResponse for BaseResponse {
    fn into_response(self) -> Response {
        let mut res = (StatusCode::OK, Json(self)).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        res
    }
}

/// Why the gate refused a request. Terminal for that request only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("token header is missing or blank")]
    InvalidTokenHeader,
    #[error("token could not be decoded")]
    TokenDecodeError(#[source] TokenError),
    #[error("token has an unexpected number of fields")]
    TokenFieldCountError(#[source] TokenError),
    #[error("token timestamp is invalid or outside the allowed window")]
    TokenTimestampInvalid(#[source] TokenError),
    #[error("service id is not recognized")]
    UnknownServiceIdentity,
}

impl GateError {
    pub fn result_code(&self) -> ResultCode {
        match self {
            GateError::InvalidTokenHeader => ResultCode::InvalidTokenHeader,
            GateError::TokenDecodeError(_) => ResultCode::TokenDecodeError,
            GateError::TokenFieldCountError(_) => ResultCode::TokenFieldCount,
            GateError::TokenTimestampInvalid(_) => ResultCode::TokenTimestamp,
            GateError::UnknownServiceIdentity => ResultCode::UnknownService,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GateError::InvalidTokenHeader => "InvalidTokenHeader",
            GateError::TokenDecodeError(_) => "TokenDecodeError",
            GateError::TokenFieldCountError(_) => "TokenFieldCountError",
            GateError::TokenTimestampInvalid(_) => "TokenTimestampInvalid",
            GateError::UnknownServiceIdentity => "UnknownServiceIdentity",
        }
    }
}

impl From<TokenError> for GateError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidEncoding | TokenError::InvalidUtf8 => GateError::TokenDecodeError(e),
            TokenError::FieldCount { .. } => GateError::TokenFieldCountError(e),
            TokenError::UnparsableTimestamp(_) | TokenError::StaleTimestamp { .. } => {
                GateError::TokenTimestampInvalid(e)
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        // HTTP 200 on purpose: clients branch on `statusCode`, not on the HTTP status.
        BaseResponse::new(self.result_code(), self.to_string()).into_response()
    }
}
