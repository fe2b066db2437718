pub mod codec;
pub mod types;

pub use codec::TokenCodec;
pub use types::{EncodeError, TokenError, TokenPolicy};
