//! Periodic population of the in-memory allow-list from the cache backend.
//!
//! The backend set (e.g. `SMEMBERS gate:service_ids`) is owned by whoever
//! provisions services. We union it with the static seed list from config
//! and swap the snapshot. A failed refresh keeps the previous snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::cache::{CacheClient, CacheResult};
use crate::services::service_ids::InMemoryServiceIdCache;

pub struct ServiceIdRefresher<C: CacheClient> {
    cache: Arc<InMemoryServiceIdCache>,
    client: C,
    key: String,
    seeds: HashSet<String>,
}

impl<C: CacheClient> ServiceIdRefresher<C> {
    pub fn new<I>(
        cache: Arc<InMemoryServiceIdCache>,
        client: C,
        key: impl Into<String>,
        seeds: I,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            cache,
            client,
            key: key.into(),
            seeds: seeds.into_iter().collect(),
        }
    }

    /// Load the backend set once and replace the snapshot.
    ///
    /// Returns the size of the new snapshot.
    pub async fn refresh_once(&self) -> CacheResult<usize> {
        let members = self.client.set_members(&self.key).await?;

        let mut ids = self.seeds.clone();
        ids.extend(
            members
                .into_iter()
                .map(|m| m.trim().to_owned())
                .filter(|m| !m.is_empty()),
        );

        let count = ids.len();
        self.cache.replace_all(ids);

        tracing::debug!(
            backend = self.client.backend_name(),
            key = %self.key,
            count,
            "service id allow-list refreshed"
        );

        Ok(count)
    }

    /// Keep refreshing every `every` on a background task.
    ///
    /// The first refresh happens one period after spawning; call `refresh_once`
    /// beforehand to populate the cache at startup.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately on the first tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh_once().await {
                    tracing::warn!(
                        error = %err,
                        backend = self.client.backend_name(),
                        key = %self.key,
                        "service id refresh failed; keeping previous allow-list"
                    );
                }
            }
        })
    }
}
