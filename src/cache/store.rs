//! Keyed result cache shared by every dashboard in the process.
//!
//! Each `(observer, endpoint)` pair owns one in-flight slot. Starting a new
//! request for a slot cancels the previous one, and a result is only stored
//! if its ticket is still the newest for the slot when it resolves. The slot
//! is freed when its ticket is dropped.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    filters::{AnalyticsQuery, Endpoint},
    settings::AnalyticsSettings,
};

use super::FetchError;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Everything that determines a response. The caller is part of the key so
/// two users never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub caller_id: String,
    pub endpoint: Endpoint,
    pub query: AnalyticsQuery,
}

impl QueryKey {
    pub fn new(caller_id: impl Into<String>, endpoint: Endpoint, query: AnalyticsQuery) -> Self {
        Self {
            caller_id: caller_id.into(),
            endpoint,
            query,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub capacity: usize,
    pub stale_time: Duration,
    pub request_timeout: Duration,
}

impl From<&AnalyticsSettings> for CacheConfig {
    fn from(settings: &AnalyticsSettings) -> Self {
        Self {
            capacity: settings.cache_capacity.max(1),
            stale_time: settings.stale_time(),
            request_timeout: settings.request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from(&AnalyticsSettings::default())
    }
}

/// Handle for one in-flight request. Holds its slot until dropped.
pub struct Ticket<'a> {
    cache: &'a QueryCache,
    observer: Uuid,
    generation: u64,
    key: QueryKey,
    token: CancellationToken,
}

impl Ticket<'_> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// True once a newer request claimed the same slot or the slot was
    /// released.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.lock();
        let slot = (self.observer, self.key.endpoint);
        if state
            .slots
            .get(&slot)
            .is_some_and(|current| current.generation == self.generation)
        {
            state.slots.remove(&slot);
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    fetched_at: Instant,
}

struct Slot {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    slots: HashMap<(Uuid, Endpoint), Slot>,
    next_generation: u64,
}

pub struct QueryCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the `(observer, key.endpoint)` slot, cancelling whatever was
    /// running there.
    pub fn begin(&self, observer: Uuid, key: QueryKey) -> Ticket<'_> {
        let mut state = self.lock();
        state.next_generation += 1;
        let generation = state.next_generation;
        let token = CancellationToken::new();

        let previous = state.slots.insert(
            (observer, key.endpoint),
            Slot {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            if !previous.token.is_cancelled() {
                log_debug!("superseding {} request for {observer}", key.endpoint.path());
            }
            previous.token.cancel();
        }

        Ticket {
            cache: self,
            observer,
            generation,
            key,
            token,
        }
    }

    /// Cancels the slot without starting anything new, e.g. when a widget
    /// becomes disabled.
    pub fn release(&self, observer: Uuid, endpoint: Endpoint) {
        if let Some(slot) = self.lock().slots.remove(&(observer, endpoint)) {
            slot.token.cancel();
        }
    }

    /// Requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.lock().slots.len()
    }

    fn is_current(&self, ticket: &Ticket<'_>) -> bool {
        self.lock()
            .slots
            .get(&(ticket.observer, ticket.key.endpoint))
            .is_some_and(|slot| slot.generation == ticket.generation)
    }

    /// Drives `fetch` under the configured timeout. Superseded tickets never
    /// write to the cache and always report `FetchError::Superseded`.
    pub async fn run<T, F>(&self, ticket: &Ticket<'_>, fetch: F) -> Result<T, FetchError>
    where
        T: Serialize,
        F: Future<Output = Result<T, FetchError>>,
    {
        let timeout = self.config.request_timeout;
        let outcome = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => Err(FetchError::Superseded),
            result = tokio::time::timeout(timeout, fetch) => match result {
                Ok(result) => result,
                Err(_) => {
                    log_warn!("{} timed out after {}ms", ticket.key.endpoint.path(), timeout.as_millis());
                    Err(FetchError::Timeout(timeout))
                }
            },
        };

        if !self.is_current(ticket) {
            return Err(FetchError::Superseded);
        }

        let value = outcome?;
        match serde_json::to_value(&value) {
            Ok(json) => self.store(ticket.key.clone(), json),
            Err(err) => log_warn!("not caching {}: {err}", ticket.key.endpoint.path()),
        }
        Ok(value)
    }

    fn store(&self, key: QueryKey, value: serde_json::Value) {
        let mut state = self.lock();
        state.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );

        while state.entries.len() > self.config.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    state.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Last stored value for `key`, fresh or not.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let state = self.lock();
        let entry = state.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.config.stale_time)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate_all(&self) {
        self.lock().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use std::sync::Arc;

    fn config() -> CacheConfig {
        CacheConfig {
            capacity: 8,
            stale_time: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn key(endpoint: Endpoint, id: &str) -> QueryKey {
        QueryKey::new(
            "caller",
            endpoint,
            AnalyticsQuery {
                scope: Scope::Team,
                id: Some(id.into()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn stores_successful_results() {
        let cache = QueryCache::new(config());
        let observer = Uuid::new_v4();
        let ticket = cache.begin(observer, key(Endpoint::Pulse, "t-1"));
        let value = cache.run(&ticket, async { Ok(vec![1u32, 2, 3]) }).await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(cache.peek::<Vec<u32>>(&key(Endpoint::Pulse, "t-1")), Some(vec![1, 2, 3]));
        assert!(cache.is_fresh(&key(Endpoint::Pulse, "t-1")));
        assert!(!cache.is_fresh(&key(Endpoint::Pulse, "t-2")));
    }

    #[tokio::test]
    async fn zero_stale_time_is_never_fresh() {
        let cache = QueryCache::new(CacheConfig {
            stale_time: Duration::ZERO,
            ..config()
        });
        let ticket = cache.begin(Uuid::new_v4(), key(Endpoint::Overview, "t-1"));
        cache.run(&ticket, async { Ok(1u8) }).await.unwrap();
        assert!(!cache.is_fresh(&key(Endpoint::Overview, "t-1")));
        assert_eq!(cache.peek::<u8>(&key(Endpoint::Overview, "t-1")), Some(1));
    }

    #[tokio::test]
    async fn newer_request_supersedes_in_flight_one() {
        let cache = Arc::new(QueryCache::new(config()));
        let observer = Uuid::new_v4();

        let slow_run = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let slow = cache.begin(observer, key(Endpoint::Leaderboard, "t-old"));
                cache
                    .run(&slow, async {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok("old".to_string())
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = cache.begin(observer, key(Endpoint::Leaderboard, "t-new"));
        let fresh = cache.run(&fast, async { Ok("new".to_string()) }).await.unwrap();

        assert_eq!(fresh, "new");
        assert_eq!(slow_run.await.unwrap(), Err(FetchError::Superseded));
        assert_eq!(cache.peek::<String>(&key(Endpoint::Leaderboard, "t-old")), None);
    }

    #[tokio::test]
    async fn slots_are_per_observer_and_endpoint() {
        let cache = QueryCache::new(config());
        let observer = Uuid::new_v4();
        let first = cache.begin(observer, key(Endpoint::Pulse, "t-1"));
        let other_endpoint = cache.begin(observer, key(Endpoint::Shoutouts, "t-1"));
        let other_observer = cache.begin(Uuid::new_v4(), key(Endpoint::Pulse, "t-1"));
        assert!(!first.is_cancelled());
        assert!(!other_endpoint.is_cancelled());
        assert!(!other_observer.is_cancelled());

        let replacement = cache.begin(observer, key(Endpoint::Pulse, "t-1"));
        assert!(first.is_cancelled());
        cache.release(observer, Endpoint::Pulse);
        assert!(replacement.is_cancelled());
    }

    #[tokio::test]
    async fn finished_requests_free_their_slot() {
        let cache = QueryCache::new(config());
        for _ in 0..1000 {
            let observer = Uuid::new_v4();
            for endpoint in Endpoint::ALL {
                let ticket = cache.begin(observer, key(endpoint, "t-1"));
                cache.run(&ticket, async { Ok(1u8) }).await.unwrap();
            }
        }
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(cache.len(), Endpoint::ALL.len());
    }

    #[test]
    fn dropping_a_superseded_ticket_keeps_the_newer_slot() {
        let cache = QueryCache::new(config());
        let observer = Uuid::new_v4();
        let older = cache.begin(observer, key(Endpoint::Pulse, "t-1"));
        let newer = cache.begin(observer, key(Endpoint::Pulse, "t-2"));
        assert_eq!(cache.in_flight(), 1);

        drop(older);
        assert_eq!(cache.in_flight(), 1);
        assert!(!newer.is_cancelled());

        drop(newer);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let cache = QueryCache::new(CacheConfig {
            request_timeout: Duration::from_millis(20),
            ..config()
        });
        let ticket = cache.begin(Uuid::new_v4(), key(Endpoint::Overview, "t-1"));
        let result = cache
            .run(&ticket, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(0u8)
            })
            .await;
        assert_eq!(result, Err(FetchError::Timeout(Duration::from_millis(20))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = QueryCache::new(config());
        let ticket = cache.begin(Uuid::new_v4(), key(Endpoint::Pulse, "t-1"));
        let result: Result<u8, _> = cache
            .run(&ticket, async { Err(FetchError::Failed("boom".into())) })
            .await;
        assert_eq!(result, Err(FetchError::Failed("boom".into())));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn evicts_oldest_entry_over_capacity() {
        let cache = QueryCache::new(CacheConfig {
            capacity: 2,
            ..config()
        });
        let observer = Uuid::new_v4();
        for id in ["t-1", "t-2", "t-3"] {
            let ticket = cache.begin(observer, key(Endpoint::Pulse, id));
            cache.run(&ticket, async { Ok(id.to_string()) }).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek::<String>(&key(Endpoint::Pulse, "t-1")), None);
        assert!(cache.peek::<String>(&key(Endpoint::Pulse, "t-3")).is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
