// ── Generic concurrent entity collection ──
//
// Lock-free storage with O(1) lookups and push-based change notification
// via `watch` channels. Keys are the typed entity ids, so no secondary
// index is needed.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent collection for one entity type.
///
/// Reads are wait-free (`DashMap` shard locks only). Every mutation bumps
/// a version counter and rebuilds the snapshot that subscribers receive.
pub(crate) struct Collection<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    entries: DashMap<K, Arc<T>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<K, T> Collection<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            entries: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: K, entity: T) -> bool {
        let is_new = self.entries.insert(key, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Look up an entity by id.
    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace an entity through a closure over its current value.
    /// Returns the new value, or `None` if the key is absent.
    ///
    /// Not atomic against a concurrent `update` on the same key — callers
    /// serialize writers externally (the Coordinator's exclusive section).
    pub(crate) fn update<F>(&self, key: &K, f: F) -> Option<Arc<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get(key)?;
        let next = Arc::new(f(&current));
        self.entries.insert(key.clone(), Arc::clone(&next));
        self.rebuild_snapshot();
        self.bump_version();
        Some(next)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.entries.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl<K, T> Default for Collection<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_returns_true_for_new_key() {
        let col: Collection<u32, String> = Collection::new();
        assert!(col.upsert(1, "hello".into()));
        assert!(!col.upsert(1, "world".into()));
        assert_eq!(*col.get(&1).unwrap(), "world");
    }

    #[test]
    fn update_replaces_through_closure() {
        let col: Collection<u32, String> = Collection::new();
        col.upsert(1, "a".into());

        let next = col.update(&1, |s| format!("{s}b")).unwrap();
        assert_eq!(*next, "ab");
        assert_eq!(*col.get(&1).unwrap(), "ab");
    }

    #[test]
    fn update_on_missing_key_is_none() {
        let col: Collection<u32, String> = Collection::new();
        assert!(col.update(&9, |s| s.clone()).is_none());
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let col: Collection<u32, String> = Collection::new();
        assert!(col.snapshot().is_empty());

        col.upsert(1, "x".into());
        col.upsert(2, "y".into());
        assert_eq!(col.snapshot().len(), 2);
        assert_eq!(col.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_observe_mutations() {
        let col: Collection<u32, String> = Collection::new();
        let mut rx = col.subscribe();

        col.upsert(1, "x".into());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
