/// Request extension attached by the gate to POST requests.
///
/// Downstream code reads `transaction_id` from here instead of re-parsing the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCtx {
    pub transaction_id: String,
}

impl TransactionCtx {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
        }
    }
}
