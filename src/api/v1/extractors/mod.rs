pub mod transaction;

pub use transaction::{TransactionCtx, TransactionCtxExtractor};
