//! In-memory cache backend (for native tools and tests).

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use pwa_core::{Request, Response};

use crate::key::CacheKey;
use crate::storage::{Cache, CacheError, CacheResult, CacheStorage};

/// A single in-memory store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<CacheKey, Response>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryCache {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl Cache for MemoryCache {
    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        let key = CacheKey::for_request(request)?;
        Ok(self.entries.borrow().get(&key).cloned())
    }

    async fn put(&self, request: &Request, response: Response) -> CacheResult<()> {
        let key = CacheKey::for_request(request)?;
        if self.fail_writes.get() {
            return Err(CacheError::Storage("quota exceeded".to_string()));
        }
        self.entries.borrow_mut().insert(key, response);
        Ok(())
    }
}

/// In-memory set of named stores.
///
/// Execution contexts are single threaded, so plain `RefCell`s suffice; no
/// borrow is ever held across an await point.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RefCell<BTreeMap<String, Rc<MemoryCache>>>,
    fail_writes: Rc<Cell<bool>>,
    locked: RefCell<BTreeSet<String>>,
}

impl MemoryCacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail, as a full quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make deleting the named store fail, as a store still in use would.
    pub fn lock_store(&self, name: &str) {
        self.locked.borrow_mut().insert(name.to_string());
    }

    /// Direct handle to a store, if it exists.
    pub fn get(&self, name: &str) -> Option<Rc<MemoryCache>> {
        self.caches.borrow().get(name).cloned()
    }
}

#[async_trait(?Send)]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Rc<dyn Cache>> {
        let cache: Rc<dyn Cache> = self
            .caches
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| {
                Rc::new(MemoryCache {
                    entries: RefCell::new(HashMap::new()),
                    fail_writes: Rc::clone(&self.fail_writes),
                })
            })
            .clone();
        Ok(cache)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.caches.borrow().contains_key(name))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.caches.borrow().keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        if self.locked.borrow().contains(name) {
            return Err(CacheError::Storage(format!("{} is in use", name)));
        }
        Ok(self.caches.borrow_mut().remove(name).is_some())
    }
}
