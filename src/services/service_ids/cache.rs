/*
 * Responsibility
 * - Read-only allow-list lookup used by the request gate (`exists`)
 * - In-memory snapshot that the refresher swaps wholesale
 */
use std::collections::HashSet;
use std::sync::RwLock;

/// Allow-list of recognised service ids.
///
/// Lookups happen on every gated request, so implementations must be
/// in-memory and safe to read concurrently.
pub trait ServiceIdCache: Send + Sync {
    fn exists(&self, service_id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryServiceIdCache {
    ids: RwLock<HashSet<String>>,
}

impl InMemoryServiceIdCache {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Replace the whole snapshot. Readers see either the old set or the new one.
    pub fn replace_all(&self, ids: HashSet<String>) {
        // Poisoning can only happen mid-assignment; the set itself is still valid.
        let mut guard = self.ids.write().unwrap_or_else(|e| e.into_inner());
        *guard = ids;
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServiceIdCache for InMemoryServiceIdCache {
    fn exists(&self, service_id: &str) -> bool {
        self.ids
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(service_id)
    }
}
