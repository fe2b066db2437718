//! Cache client interface used by higher-level services (service-id allow-list, etc.).
use async_trait::async_trait;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Note:
/// - Kept independent from `AppError` so callers can decide how to fail
///   (the allow-list refresher keeps its previous snapshot, startup fails hard).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// A minimal, read-only cache interface.
///
/// The gate never writes to the backend: service ids are provisioned by
/// whoever owns the set, we only read it.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // All members of the set stored at `key`. A missing key is an empty set.
    async fn set_members(&self, key: &str) -> CacheResult<Vec<String>>;
}
