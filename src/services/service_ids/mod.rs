pub mod cache;
pub mod refresh;

pub use cache::{InMemoryServiceIdCache, ServiceIdCache};
pub use refresh::ServiceIdRefresher;
