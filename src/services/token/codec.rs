//! Token codec: base64 → delimited fields → validated values.
//!
//! Token wire format (header `token`):
//!
//! ```text
//! base64( serviceId | transactionId | epochMillis )
//! ```
//!
//! The codec is pure: no I/O and no clock. Callers pass `now_millis` so the
//! freshness check is deterministic under test.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::types::{
    DEFAULT_DELIMITER, EncodeError, FIELD_COUNT, SERVICE_ID_INDEX, TIMESTAMP_INDEX,
    TRANSACTION_ID_INDEX, TokenError, TokenPolicy,
};

#[derive(Debug, Clone)]
pub struct TokenCodec {
    delimiter: String,
    policy: TokenPolicy,
}

impl TokenCodec {
    pub fn new(policy: TokenPolicy) -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER, policy)
    }

    pub fn with_delimiter(delimiter: impl Into<String>, policy: TokenPolicy) -> Self {
        Self {
            delimiter: delimiter.into(),
            policy,
        }
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Decode the raw header value into the delimited plain-text form.
    ///
    /// Takes bytes: header values are not guaranteed to be ASCII, and anything
    /// outside the base64 alphabet is a decode failure like any other.
    pub fn decode(&self, raw: impl AsRef<[u8]>) -> Result<String, TokenError> {
        let bytes = STANDARD
            .decode(raw.as_ref().trim_ascii())
            .map_err(|_| TokenError::InvalidEncoding)?;

        String::from_utf8(bytes).map_err(|_| TokenError::InvalidUtf8)
    }

    /// Split a decoded token into its ordered fields.
    ///
    /// Never fails; the field count is checked separately by `validate_field_count`.
    pub fn parse(&self, decoded: &str) -> Vec<String> {
        decoded
            .split(self.delimiter.as_str())
            .map(str::to_owned)
            .collect()
    }

    pub fn validate_field_count(&self, fields: &[String]) -> Result<(), TokenError> {
        if fields.len() != FIELD_COUNT {
            return Err(TokenError::FieldCount {
                expected: FIELD_COUNT,
                actual: fields.len(),
            });
        }
        Ok(())
    }

    /// Check the embedded epoch-millis timestamp against `now_millis`.
    ///
    /// Returns the parsed timestamp on success.
    pub fn validate_timestamp(
        &self,
        fields: &[String],
        now_millis: i64,
    ) -> Result<i64, TokenError> {
        let raw = self.field(fields, TIMESTAMP_INDEX)?;

        let issued_at: i64 = raw
            .trim()
            .parse()
            .map_err(|_| TokenError::UnparsableTimestamp(raw.to_owned()))?;

        let skew_millis = now_millis.saturating_sub(issued_at);
        if skew_millis.saturating_abs() > self.policy.max_skew_millis {
            return Err(TokenError::StaleTimestamp { skew_millis });
        }

        Ok(issued_at)
    }

    pub fn service_id<'a>(&self, fields: &'a [String]) -> Result<&'a str, TokenError> {
        self.field(fields, SERVICE_ID_INDEX)
    }

    pub fn transaction_id<'a>(&self, fields: &'a [String]) -> Result<&'a str, TokenError> {
        self.field(fields, TRANSACTION_ID_INDEX)
    }

    /// Build a header value from its parts (used by `token-gen` and tests).
    pub fn encode(
        &self,
        service_id: &str,
        transaction_id: &str,
        timestamp_millis: i64,
    ) -> Result<String, EncodeError> {
        let timestamp = timestamp_millis.to_string();
        let parts = [service_id, transaction_id, timestamp.as_str()];

        if let Some(field) = parts.iter().find(|f| f.contains(self.delimiter.as_str())) {
            return Err(EncodeError::FieldContainsDelimiter((*field).to_owned()));
        }

        let plain = parts.join(self.delimiter.as_str());

        Ok(STANDARD.encode(plain))
    }

    fn field<'a>(&self, fields: &'a [String], index: usize) -> Result<&'a str, TokenError> {
        fields
            .get(index)
            .map(String::as_str)
            .ok_or(TokenError::FieldCount {
                expected: FIELD_COUNT,
                actual: fields.len(),
            })
    }
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new(TokenPolicy::default())
    }
}
