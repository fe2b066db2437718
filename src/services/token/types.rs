/*
 * Responsibility
 * - Token layout (field order / delimiter) and the policy knobs used by the codec
 * - Codec-local error types (TokenError is converted to GateError at the middleware boundary)
 */
use thiserror::Error;

/// Number of fields a decoded token must carry.
pub const FIELD_COUNT: usize = 3;

pub const SERVICE_ID_INDEX: usize = 0;
pub const TRANSACTION_ID_INDEX: usize = 1;
pub const TIMESTAMP_INDEX: usize = 2;

pub const DEFAULT_DELIMITER: &str = "|";

/// Freshness window applied to the embedded timestamp.
///
/// Kept separate from `Config` so the codec stays testable on its own.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    // Allowed distance between the token timestamp and "now", in milliseconds.
    // Applies in both directions (stale tokens and clocks running ahead).
    pub max_skew_millis: i64,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            max_skew_millis: 5 * 60 * 1000,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64")]
    InvalidEncoding,
    #[error("token is not valid utf-8")]
    InvalidUtf8,
    #[error("expected {expected} token fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("token timestamp is not a number: {0:?}")]
    UnparsableTimestamp(String),
    #[error("token timestamp is {skew_millis}ms away from now")]
    StaleTimestamp { skew_millis: i64 },
}

/// Failure building a token (`encode`); never produced while validating one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("token field must not contain the delimiter: {0:?}")]
    FieldContainsDelimiter(String),
}
