use super::entry::{Entry, PinnedHandle};
use crate::error::CacheError;
use crate::metrics::{CACHE_ALLOC_FAILURES, CACHE_EVICTIONS, CACHE_USED_BYTES};
use lru::LruCache;
use rustc_hash::{FxHashMap, FxHasher};
use std::{
    fmt::Debug,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tracing::{debug, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Merge {
    Keep,
    Replace,
}

type Bucket<K, V> = FxHashMap<K, Arc<Entry<V>>>;

//Every bucket has its own lock, the recency list has another one. Only
//eviction and remove hold both, and always take recency first.
pub struct LruStore<K, V> {
    name: &'static str,
    buckets: Vec<Mutex<Bucket<K, V>>>,
    recency: Mutex<LruCache<K, ()>>,
    used: AtomicUsize,
    max_bytes: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    //no code panics while holding these locks, a poisoned one is still consistent
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone + Debug,
{
    pub fn new(name: &'static str, max_bytes: usize, bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        let buckets = (0..bucket_count)
            .map(|_| Mutex::new(FxHashMap::default()))
            .collect();
        LruStore {
            name,
            buckets,
            recency: Mutex::new(LruCache::unbounded()),
            used: AtomicUsize::new(0),
            max_bytes,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| lock(bucket).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket(&self, key: &K) -> &Mutex<Bucket<K, V>> {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.buckets.len() as u64) as usize;
        &self.buckets[index]
    }

    pub fn contains(&self, key: &K) -> bool {
        lock(self.bucket(key)).contains_key(key)
    }

    pub fn lookup(&self, key: &K) -> Option<PinnedHandle<V>> {
        let handle = lock(self.bucket(key)).get(key).map(PinnedHandle::pin)?;
        lock(&self.recency).promote(key);
        Some(handle)
    }

    pub fn insert_or_update<F>(&self, key: K, value: V, cost: usize, merge: F) -> bool
    where
        F: FnOnce(&V, &V) -> Merge,
    {
        match self.try_insert_or_update(key, value, cost, merge) {
            Ok(()) => true,
            Err(e) => {
                warn!(table = self.name, error = %e, "drop cache insert");
                false
            }
        }
    }

    pub fn try_insert_or_update<F>(
        &self,
        key: K,
        value: V,
        cost: usize,
        merge: F,
    ) -> Result<(), CacheError>
    where
        F: FnOnce(&V, &V) -> Merge,
    {
        if cost > self.max_bytes {
            CACHE_ALLOC_FAILURES.with_label_values(&[self.name]).inc();
            return Err(CacheError::TableFull(self.name, format!("{:?}", key)));
        }

        let is_new = {
            let mut bucket = lock(self.bucket(&key));
            let decision = bucket
                .get(&key)
                .map(|existing| (merge(existing.value(), &value), existing.cost()));
            match decision {
                Some((Merge::Keep, _)) => false,
                Some((Merge::Replace, old_cost)) => {
                    bucket.insert(key.clone(), Arc::new(Entry::new(value, cost)));
                    self.used.fetch_add(cost, Ordering::AcqRel);
                    self.used.fetch_sub(old_cost, Ordering::AcqRel);
                    false
                }
                None => {
                    if let Err(e) = bucket.try_reserve(1) {
                        CACHE_ALLOC_FAILURES.with_label_values(&[self.name]).inc();
                        return Err(CacheError::AllocFailed(self.name, e));
                    }
                    bucket.insert(key.clone(), Arc::new(Entry::new(value, cost)));
                    self.used.fetch_add(cost, Ordering::AcqRel);
                    true
                }
            }
        };

        {
            let mut recency = lock(&self.recency);
            if is_new {
                recency.put(key, ());
            } else {
                recency.promote(&key);
            }
        }

        self.evict_if_needed();
        self.update_used_gauge();
        Ok(())
    }

    #[inline]
    fn update_used_gauge(&self) {
        CACHE_USED_BYTES
            .with_label_values(&[self.name])
            .set(self.used_bytes() as i64);
    }

    pub fn remove(&self, key: &K) -> bool {
        let mut recency = lock(&self.recency);
        let removed = lock(self.bucket(key)).remove(key);
        recency.pop(key);
        match removed {
            Some(entry) => {
                self.used.fetch_sub(entry.cost(), Ordering::AcqRel);
                self.update_used_gauge();
                true
            }
            None => false,
        }
    }

    fn evict_if_needed(&self) {
        if self.used_bytes() <= self.max_bytes {
            return;
        }

        let mut recency = lock(&self.recency);
        let mut victims = Vec::new();
        let mut evicted = 0;
        for (key, _) in recency.iter().rev() {
            if self.used_bytes() <= self.max_bytes {
                break;
            }
            let mut bucket = lock(self.bucket(key));
            if bucket.get(key).map_or(false, |entry| entry.is_pinned()) {
                continue;
            }
            if let Some(entry) = bucket.remove(key) {
                self.used.fetch_sub(entry.cost(), Ordering::AcqRel);
                evicted += 1;
            }
            victims.push(key.clone());
        }
        for key in &victims {
            recency.pop(key);
        }

        if evicted > 0 {
            CACHE_EVICTIONS
                .with_label_values(&[self.name])
                .inc_by(evicted);
            debug!(
                table = self.name,
                evicted,
                used = self.used_bytes(),
                "lru eviction"
            );
        }
        if self.used_bytes() > self.max_bytes {
            debug!(
                table = self.name,
                used = self.used_bytes(),
                max = self.max_bytes,
                "every remaining entry is pinned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep_old(_: &String, _: &String) -> Merge {
        Merge::Keep
    }

    fn take_new(_: &String, _: &String) -> Merge {
        Merge::Replace
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = LruStore::<u32, String>::new("test", 100, 4);
        assert!(store.lookup(&1).is_none());
        assert!(store.insert_or_update(1, "one".to_string(), 10, take_new));
        assert_eq!(*store.lookup(&1).unwrap(), "one");
        assert_eq!(store.used_bytes(), 10);

        assert!(store.insert_or_update(1, "uno".to_string(), 20, keep_old));
        assert_eq!(*store.lookup(&1).unwrap(), "one");
        assert_eq!(store.used_bytes(), 10);

        assert!(store.insert_or_update(1, "uno".to_string(), 20, take_new));
        assert_eq!(*store.lookup(&1).unwrap(), "uno");
        assert_eq!(store.used_bytes(), 20);
        assert_eq!(store.len(), 1);

        assert!(store.remove(&1));
        assert!(!store.remove(&1));
        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_merge_sees_both_values() {
        let store = LruStore::<u32, u32>::new("test", 100, 1);
        store.insert_or_update(1, 5, 1, |_, _| Merge::Replace);
        for incoming in vec![3, 9, 7] {
            store.insert_or_update(1, incoming, 1, |old: &u32, new: &u32| {
                if new > old {
                    Merge::Replace
                } else {
                    Merge::Keep
                }
            });
        }
        assert_eq!(*store.lookup(&1).unwrap(), 9);
    }

    #[test]
    fn test_lru_eviction_order() {
        let store = LruStore::<u32, String>::new("test", 30, 2);
        for i in 0..3 {
            store.insert_or_update(i, i.to_string(), 10, take_new);
        }
        //touch the oldest one
        assert!(store.lookup(&0).is_some());
        store.insert_or_update(3, "3".to_string(), 10, take_new);
        assert!(store.contains(&0));
        assert!(!store.contains(&1));
        assert!(store.contains(&2));
        assert!(store.contains(&3));
        assert_eq!(store.used_bytes(), 30);
    }

    #[test]
    fn test_pinned_entry_is_not_evicted() {
        let store = LruStore::<u32, String>::new("test", 20, 2);
        store.insert_or_update(0, "0".to_string(), 10, take_new);
        store.insert_or_update(1, "1".to_string(), 10, take_new);
        let pinned = store.lookup(&0).unwrap();
        store.insert_or_update(1, "1".to_string(), 10, take_new);

        store.insert_or_update(2, "2".to_string(), 10, take_new);
        assert!(store.contains(&0));
        assert!(!store.contains(&1));

        let second_pin = pinned.clone();
        drop(pinned);
        store.insert_or_update(3, "3".to_string(), 10, take_new);
        assert!(store.contains(&0));
        assert_eq!(*second_pin, "0");

        drop(second_pin);
        store.insert_or_update(4, "4".to_string(), 10, take_new);
        assert!(!store.contains(&0));
        assert_eq!(store.used_bytes(), 20);
    }

    #[test]
    fn test_all_pinned_goes_over_budget() {
        let store = LruStore::<u32, String>::new("test", 10, 1);
        store.insert_or_update(0, "0".to_string(), 10, take_new);
        let _pinned = store.lookup(&0).unwrap();
        assert!(store.insert_or_update(1, "1".to_string(), 10, take_new));
        assert!(store.contains(&0));
        assert!(!store.contains(&1));
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_used_bytes_gauge() {
        let gauge = || CACHE_USED_BYTES.with_label_values(&["gauge"]).get();
        let store = LruStore::<u32, String>::new("gauge", 100, 2);
        store.insert_or_update(0, "0".to_string(), 10, take_new);
        store.insert_or_update(1, "1".to_string(), 20, take_new);
        assert_eq!(gauge(), 30);
        assert!(store.remove(&1));
        assert_eq!(gauge(), 10);
        assert!(store.remove(&0));
        assert_eq!(gauge(), 0);
    }

    #[test]
    fn test_oversized_entry() {
        let store = LruStore::<u32, String>::new("test", 10, 1);
        assert!(!store.insert_or_update(0, "0".to_string(), 11, take_new));
        match store.try_insert_or_update(0, "0".to_string(), 11, take_new) {
            Err(CacheError::TableFull("test", _)) => {}
            other => panic!("unexpected result {:?}", other.is_ok()),
        }
        assert!(store.is_empty());
    }
}
