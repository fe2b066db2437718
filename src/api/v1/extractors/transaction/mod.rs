/*!
 * Transaction context extractor
 *
 * Responsibility:
 * - Hand the transaction id taken from the token to handlers of mutating (POST) requests
 * - The request gate inserts `TransactionCtx`; handlers only ever read it
 *
 * Public API:
 * - TransactionCtx
 * - TransactionCtxExtractor
 */

mod core;
mod types;

pub use self::core::TransactionCtxExtractor;
pub use types::TransactionCtx;
