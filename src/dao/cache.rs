//! Time-bounded read-through caching of whole-table snapshots.
//!
//! Entries expire `ttl` after they were stored. Writers invalidate the dataset
//! they touched. Every invalidation bumps a generation, and a fetch that
//! started before the bump is returned to its caller but never stored.

use std::{
    fmt,
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    dao::models::{AssignmentEntity, ParticipantEntity},
    state::league::{AvailabilityWindow, Fixture},
};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Invalidation counters observed before a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    epoch: u64,
    key: u64,
}

/// Concurrent key/value cache with a fixed time-to-live.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
    generations: DashMap<K, u64>,
    /// Bumped by a full clear.
    epoch: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            generations: DashMap::new(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Value stored under `key`, if it has not expired yet.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.value.clone())
    }

    /// Store `value` unconditionally.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the fresh cached value for `key`, or run `fetch` and cache its result.
    ///
    /// A failed fetch is returned as-is and nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: K,
        force_refresh: bool,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if !force_refresh {
            if let Some(value) = self.get(&key) {
                debug!(?key, "cache hit");
                return Ok(value);
            }
        }

        debug!(?key, force_refresh, "cache miss");
        let seen = self.generation(&key);
        let value = fetch().await?;
        if !self.insert_if_current(key.clone(), value.clone(), seen) {
            debug!(?key, "invalidated during fetch; result not cached");
        }
        Ok(value)
    }

    /// Drop one entry, or every entry when `key` is `None`.
    pub fn invalidate(&self, key: Option<&K>) {
        match key {
            Some(key) => {
                *self.generations.entry(key.clone()).or_insert(0) += 1;
                self.entries.remove(key);
            }
            None => {
                self.epoch.fetch_add(1, Ordering::SeqCst);
                self.entries.clear();
            }
        }
    }

    fn generation(&self, key: &K) -> Generation {
        Generation {
            epoch: self.epoch.load(Ordering::SeqCst),
            key: self.generations.get(key).map_or(0, |generation| *generation),
        }
    }

    /// Store a fetched value unless `key` was invalidated since `seen`.
    fn insert_if_current(&self, key: K, value: V, seen: Generation) -> bool {
        // Holding the generation entry serializes against a keyed invalidate.
        let generation = self.generations.entry(key.clone()).or_insert(0);
        if *generation != seen.key || self.epoch.load(Ordering::SeqCst) != seen.epoch {
            return false;
        }
        self.insert(key.clone(), value);
        drop(generation);

        // A full clear bumps the epoch before clearing, so re-check after storing.
        if self.epoch.load(Ordering::SeqCst) != seen.epoch {
            self.entries.remove(&key);
            return false;
        }
        true
    }
}

/// Logical tables cached by the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKey {
    /// Users table.
    Participants,
    /// Group assignments.
    Assignments,
    /// Availability windows.
    Availability,
    /// Fixtures table.
    Fixtures,
}

/// One typed snapshot cache per dataset, shared by every repository.
pub struct LeagueCache {
    /// Raw Users rows.
    pub participants: TtlCache<DatasetKey, Arc<Vec<ParticipantEntity>>>,
    /// Raw Assignments rows.
    pub assignments: TtlCache<DatasetKey, Arc<Vec<AssignmentEntity>>>,
    /// Normalized windows of every participant.
    pub availability: TtlCache<DatasetKey, Arc<Vec<AvailabilityWindow>>>,
    /// Normalized fixtures.
    pub fixtures: TtlCache<DatasetKey, Arc<Vec<Fixture>>>,
}

impl LeagueCache {
    /// One empty cache per dataset, all sharing `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            participants: TtlCache::new(ttl),
            assignments: TtlCache::new(ttl),
            availability: TtlCache::new(ttl),
            fixtures: TtlCache::new(ttl),
        }
    }

    /// Drop one dataset's snapshot, or all of them when `key` is `None`.
    pub fn invalidate(&self, key: Option<DatasetKey>) {
        match key {
            Some(key @ DatasetKey::Participants) => self.participants.invalidate(Some(&key)),
            Some(key @ DatasetKey::Assignments) => self.assignments.invalidate(Some(&key)),
            Some(key @ DatasetKey::Availability) => self.availability.invalidate(Some(&key)),
            Some(key @ DatasetKey::Fixtures) => self.fixtures.invalidate(Some(&key)),
            None => {
                self.participants.invalidate(None);
                self.assignments.invalidate(None);
                self.availability.invalidate(None);
                self.fixtures.invalidate(None);
            }
        }
    }
}

impl Default for LeagueCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn fetch_counting(calls: &AtomicU32) -> Result<u32, String> {
        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[tokio::test(start_paused = true)]
    async fn serves_cached_value_until_ttl_elapses() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let calls = AtomicU32::new(0);

        let first = cache
            .get_or_fetch(DatasetKey::Fixtures, false, || fetch_counting(&calls))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache
            .get_or_fetch(DatasetKey::Fixtures, false, || fetch_counting(&calls))
            .await
            .unwrap();
        assert_eq!((first, second), (1, 1));

        tokio::time::advance(Duration::from_secs(1)).await;
        let third = cache
            .get_or_fetch(DatasetKey::Fixtures, false, || fetch_counting(&calls))
            .await
            .unwrap();
        assert_eq!(third, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn force_refresh_and_invalidate_bypass_the_entry() {
        let cache = TtlCache::new(Duration::from_secs(300));
        let calls = AtomicU32::new(0);

        cache
            .get_or_fetch(DatasetKey::Availability, false, || fetch_counting(&calls))
            .await
            .unwrap();
        let forced = cache
            .get_or_fetch(DatasetKey::Availability, true, || fetch_counting(&calls))
            .await
            .unwrap();
        assert_eq!(forced, 2);

        cache.invalidate(Some(&DatasetKey::Availability));
        assert!(cache.get(&DatasetKey::Availability).is_none());

        cache.insert(DatasetKey::Fixtures, 7);
        cache.insert(DatasetKey::Participants, 8);
        cache.invalidate(None);
        assert!(cache.get(&DatasetKey::Fixtures).is_none());
        assert!(cache.get(&DatasetKey::Participants).is_none());
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache: TtlCache<DatasetKey, u32> = TtlCache::new(Duration::from_secs(300));

        let err = cache
            .get_or_fetch(DatasetKey::Fixtures, false, || async {
                Err::<u32, _>("store down".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err, "store down");
        assert!(cache.get(&DatasetKey::Fixtures).is_none());
    }

    #[tokio::test]
    async fn invalidate_during_fetch_keeps_the_old_snapshot_out() {
        let cache: TtlCache<DatasetKey, &str> = TtlCache::new(Duration::from_secs(300));
        let (release, released) = tokio::sync::oneshot::channel::<()>();

        let reader = cache.get_or_fetch(DatasetKey::Availability, false, || async move {
            let _ = released.await;
            Ok::<_, String>("old")
        });
        let writer = async {
            tokio::task::yield_now().await;
            cache.invalidate(Some(&DatasetKey::Availability));
            let _ = release.send(());
        };
        let (read, ()) = tokio::join!(reader, writer);
        assert_eq!(read.unwrap(), "old");
        assert!(cache.get(&DatasetKey::Availability).is_none());

        let next = cache
            .get_or_fetch(DatasetKey::Availability, false, || async {
                Ok::<_, String>("new")
            })
            .await
            .unwrap();
        assert_eq!(next, "new");
        assert_eq!(cache.get(&DatasetKey::Availability), Some("new"));
    }

    #[tokio::test]
    async fn full_clear_during_fetch_keeps_the_old_snapshot_out() {
        let cache: TtlCache<DatasetKey, u32> = TtlCache::new(Duration::from_secs(300));
        let (release, released) = tokio::sync::oneshot::channel::<()>();

        let reader = cache.get_or_fetch(DatasetKey::Fixtures, false, || async move {
            let _ = released.await;
            Ok::<_, String>(1)
        });
        let writer = async {
            tokio::task::yield_now().await;
            cache.invalidate(None);
            let _ = release.send(());
        };
        let (read, ()) = tokio::join!(reader, writer);
        assert_eq!(read.unwrap(), 1);
        assert!(cache.get(&DatasetKey::Fixtures).is_none());
    }

    #[tokio::test]
    async fn league_cache_invalidates_one_dataset() {
        let cache = LeagueCache::default();
        cache
            .fixtures
            .insert(DatasetKey::Fixtures, Arc::new(Vec::new()));
        cache
            .participants
            .insert(DatasetKey::Participants, Arc::new(Vec::new()));

        cache.invalidate(Some(DatasetKey::Fixtures));
        assert!(cache.fixtures.get(&DatasetKey::Fixtures).is_none());
        assert!(cache.participants.get(&DatasetKey::Participants).is_some());
    }
}
