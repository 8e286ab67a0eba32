use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

/// Snapshot of cache interactions, useful for telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: usize,
    pub misses: usize,
}

/// Shared handle that lets a service and its chunkers reuse one count cache.
#[derive(Clone, Default)]
pub struct CacheHandle {
    inner: Arc<Mutex<Option<TokenCountCache>>>,
}

impl CacheHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_capacity(capacity: Option<usize>) -> Self {
        let handle = Self::new();
        handle.apply_capacity(capacity);
        handle
    }

    /// `Some(0)` disables the cache, `Some(n)` resizes it, `None` leaves the
    /// current state untouched.
    pub fn apply_capacity(&self, capacity: Option<usize>) {
        let mut guard = self.lock();
        match capacity {
            Some(0) => {
                *guard = None;
            }
            Some(limit) => {
                let replace = match guard.as_ref() {
                    Some(existing) => existing.capacity() != Some(limit),
                    None => true,
                };
                if replace {
                    *guard = Some(TokenCountCache::new(Some(limit)));
                }
            }
            None => {}
        }
    }

    pub fn disable(&self) {
        *self.lock() = None;
    }

    pub fn capacity(&self) -> Option<usize> {
        self.lock().as_ref().and_then(TokenCountCache::capacity)
    }

    pub fn metrics(&self) -> Option<CacheMetrics> {
        self.lock().as_ref().map(TokenCountCache::metrics)
    }

    pub fn lock(&self) -> MutexGuard<'_, Option<TokenCountCache>> {
        self.inner.lock().expect("count cache mutex poisoned")
    }
}

/// Bounded memo of token counts keyed by hashed tokenizer name and text, so
/// entries from different encoders never collide. Separator fragments recur
/// constantly during packing, so even a small capacity pays off.
#[derive(Debug)]
pub struct TokenCountCache {
    capacity: Option<usize>,
    entries: HashMap<u64, usize>,
    order: VecDeque<u64>,
    hits: usize,
    misses: usize,
}

impl TokenCountCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get(&mut self, namespace: &str, text: &str) -> Option<usize> {
        let key = hash_keyed(namespace, text);
        if let Some(count) = self.entries.get(&key).copied() {
            touch(&mut self.order, key);
            self.hits += 1;
            Some(count)
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, namespace: &str, text: &str, count: usize) {
        let key = hash_keyed(namespace, text);
        if self.entries.insert(key, count).is_some() {
            touch(&mut self.order, key);
            return;
        }

        if let Some(limit) = self.capacity {
            while self.order.len() >= limit {
                match self.order.pop_front() {
                    Some(evicted) => {
                        self.entries.remove(&evicted);
                    }
                    None => break,
                }
            }
        }
        self.order.push_back(key);
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

fn touch(order: &mut VecDeque<u64>, key: u64) {
    if let Some(pos) = order.iter().position(|entry| *entry == key) {
        order.remove(pos);
    }
    order.push_back(key);
}

fn hash_keyed(namespace: &str, text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    namespace.hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}
