use std::{
    fmt,
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

pub(crate) struct Entry<V> {
    value: V,
    cost: usize,
    pins: AtomicUsize,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, cost: usize) -> Self {
        Entry {
            value,
            cost,
            pins: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub(crate) fn cost(&self) -> usize {
        self.cost
    }

    //a pinned entry is being read and mustn't be evicted
    #[inline]
    pub(crate) fn is_pinned(&self) -> bool {
        self.pins.load(Ordering::Acquire) > 0
    }
}

pub struct PinnedHandle<V> {
    entry: Arc<Entry<V>>,
}

impl<V> PinnedHandle<V> {
    //caller must hold the lock of the bucket owning the entry
    pub(crate) fn pin(entry: &Arc<Entry<V>>) -> Self {
        entry.pins.fetch_add(1, Ordering::AcqRel);
        PinnedHandle {
            entry: entry.clone(),
        }
    }

    #[inline]
    pub fn cost(&self) -> usize {
        self.entry.cost
    }
}

impl<V> Deref for PinnedHandle<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.entry.value
    }
}

impl<V> Clone for PinnedHandle<V> {
    fn clone(&self) -> Self {
        PinnedHandle::pin(&self.entry)
    }
}

impl<V> Drop for PinnedHandle<V> {
    fn drop(&mut self) {
        self.entry.pins.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<V: fmt::Debug> fmt::Debug for PinnedHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PinnedHandle")
            .field("value", &self.entry.value)
            .field("cost", &self.entry.cost)
            .finish()
    }
}
