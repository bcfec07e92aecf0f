//! The current-version store and its install/activate lifecycle.

use std::rc::Rc;

use async_trait::async_trait;
use pwa_core::{CacheVersion, Network, Request, Response, Scope};
use tracing::{debug, info, warn};

use crate::policy::Admission;
use crate::storage::{CacheResult, CacheStorage};

/// Worker-level lifecycle controls exposed by the platform.
#[async_trait(?Send)]
pub trait WorkerControl {
    /// Activate without waiting for existing pages to close.
    async fn skip_waiting(&self) -> Result<(), String>;

    /// Take control of every open page in scope.
    async fn claim_clients(&self) -> Result<(), String>;
}

/// Result of pre-populating the shell on install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Paths written to the store.
    pub cached: Vec<String>,
    /// Paths that could not be cached, with the reason.
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    /// Whether every shell resource was cached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The cache generation named after the configured version.
///
/// Exactly one store is current; every other named store is stale and is
/// removed on activation. There is no per-entry expiry.
#[derive(Clone)]
pub struct CacheStore {
    storage: Rc<dyn CacheStorage>,
    version: CacheVersion,
}

impl CacheStore {
    /// Create a store handle over the given storage.
    pub fn new(storage: Rc<dyn CacheStorage>, version: CacheVersion) -> Self {
        Self { storage, version }
    }

    /// The current version (also the store name).
    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Rc<dyn CacheStorage> {
        &self.storage
    }

    /// Look up a request in the current store.
    pub async fn lookup(&self, request: &Request) -> CacheResult<Option<Response>> {
        let cache = self.storage.open(self.version.as_str()).await?;
        cache.match_request(request).await
    }

    /// Write a response if it passes admission. Returns whether it was written.
    pub async fn store(&self, request: &Request, response: Response) -> CacheResult<bool> {
        let admission = Admission::check(&response);
        if !admission.is_admitted() {
            debug!(url = %request.url, %admission, "response not cached");
            return Ok(false);
        }

        let cache = self.storage.open(self.version.as_str()).await?;
        cache.put(request, response).await?;
        Ok(true)
    }

    /// Open the current store and pre-populate it with the shell resources.
    ///
    /// Best effort: an unreachable or unqualified resource is recorded in the
    /// report and never aborts installation.
    pub async fn precache(
        &self,
        network: &dyn Network,
        scope: &Scope,
        resources: &[String],
    ) -> InstallReport {
        let mut report = InstallReport::default();

        if let Err(e) = self.storage.open(self.version.as_str()).await {
            warn!(version = %self.version, error = %e, "failed to open cache on install");
            report.failed = resources
                .iter()
                .map(|path| (path.clone(), e.to_string()))
                .collect();
            return report;
        }

        for path in resources {
            match self.precache_one(network, scope, path).await {
                Ok(()) => report.cached.push(path.clone()),
                Err(reason) => {
                    warn!(path = %path, reason = %reason, "shell resource not cached");
                    report.failed.push((path.clone(), reason));
                }
            }
        }

        report
    }

    async fn precache_one(
        &self,
        network: &dyn Network,
        scope: &Scope,
        path: &str,
    ) -> Result<(), String> {
        let url = scope.resolve(path).map_err(|e| e.to_string())?;
        let request = Request::get(url);
        let response = network.fetch(&request).await.map_err(|e| e.to_string())?;

        let admission = Admission::check(&response);
        if !admission.is_admitted() {
            return Err(admission.to_string());
        }

        self.store(&request, response)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Delete every named store other than the current one. Returns the deleted names.
    ///
    /// A store that fails to delete is logged and skipped; only listing the
    /// stores is fatal.
    pub async fn evict_stale(&self) -> CacheResult<Vec<String>> {
        let mut deleted = Vec::new();

        for name in self.storage.keys().await? {
            if name == self.version.as_str() {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(true) => {
                    info!(cache = %name, "deleted stale cache");
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => warn!(cache = %name, error = %e, "failed to delete stale cache"),
            }
        }

        Ok(deleted)
    }
}

/// Install: pre-cache the shell (best effort), then skip waiting.
pub async fn install(
    store: &CacheStore,
    control: &dyn WorkerControl,
    network: &dyn Network,
    scope: &Scope,
    resources: &[String],
) -> InstallReport {
    let report = store.precache(network, scope, resources).await;
    info!(
        version = %store.version(),
        cached = report.cached.len(),
        failed = report.failed.len(),
        "install complete"
    );

    if let Err(e) = control.skip_waiting().await {
        warn!(error = %e, "skip_waiting failed");
    }

    report
}

/// Activate: evict stale stores, then claim every open page.
///
/// Clients are claimed even when eviction fails, so the new worker always
/// takes over.
pub async fn activate(store: &CacheStore, control: &dyn WorkerControl) -> CacheResult<Vec<String>> {
    let evicted = store.evict_stale().await;

    if let Err(e) = control.claim_clients().await {
        warn!(error = %e, "claiming clients failed");
    }

    evicted
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use pwa_core::{NetworkError, ResponseType};

    use super::*;
    use crate::memory::MemoryCacheStorage;

    #[derive(Default)]
    struct FakeNetwork {
        responses: HashMap<String, Response>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeNetwork {
        fn with(mut self, path: &str, response: Response) -> Self {
            self.responses.insert(path.to_string(), response);
            self
        }
    }

    #[async_trait(?Send)]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            self.requested.borrow_mut().push(request.path().to_string());
            self.responses
                .get(request.path())
                .cloned()
                .ok_or_else(|| NetworkError::Connection("offline".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeControl {
        skipped: Cell<bool>,
        claimed: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl WorkerControl for FakeControl {
        async fn skip_waiting(&self) -> Result<(), String> {
            self.skipped.set(true);
            Ok(())
        }

        async fn claim_clients(&self) -> Result<(), String> {
            self.claimed.set(true);
            Ok(())
        }
    }

    fn scope() -> Scope {
        Scope::parse("https://app.example.com/").unwrap()
    }

    fn resources(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_install_precaches_and_skips_waiting() {
        let storage = Rc::new(MemoryCacheStorage::new());
        let store = CacheStore::new(storage.clone(), CacheVersion::new("v1"));
        let network = FakeNetwork::default()
            .with("/manifest.json", Response::new(200, "{}"))
            .with("/icons/icon-192x192.png", Response::new(200, "png"));
        let control = FakeControl::default();

        let report = install(
            &store,
            &control,
            &network,
            &scope(),
            &resources(&["/manifest.json", "/icons/icon-192x192.png"]),
        )
        .await;

        assert!(report.is_complete());
        assert_eq!(report.cached.len(), 2);
        assert!(control.skipped.get());
        assert_eq!(storage.get("v1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_install_survives_unreachable_resource() {
        let storage = Rc::new(MemoryCacheStorage::new());
        let store = CacheStore::new(storage.clone(), CacheVersion::new("v1"));
        let network = FakeNetwork::default().with("/manifest.json", Response::new(200, "{}"));
        let control = FakeControl::default();

        let report = install(
            &store,
            &control,
            &network,
            &scope(),
            &resources(&["/manifest.json", "/icons/missing.png"]),
        )
        .await;

        assert_eq!(report.cached, vec!["/manifest.json".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(control.skipped.get());
        assert_eq!(storage.get("v1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_install_skips_unqualified_shell_response() {
        let storage = Rc::new(MemoryCacheStorage::new());
        let store = CacheStore::new(storage.clone(), CacheVersion::new("v1"));
        let network = FakeNetwork::default().with("/", Response::new(404, "nope"));
        let control = FakeControl::default();

        let report = install(&store, &control, &network, &scope(), &resources(&["/"])).await;

        assert!(!report.is_complete());
        assert!(storage.get("v1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_evicts_previous_versions() {
        let storage = Rc::new(MemoryCacheStorage::new());
        storage.open("v1").await.unwrap();
        storage.open("unrelated").await.unwrap();
        storage.open("v2").await.unwrap();

        let store = CacheStore::new(storage.clone(), CacheVersion::new("v2"));
        let control = FakeControl::default();

        let mut evicted = activate(&store, &control).await.unwrap();
        evicted.sort();

        assert_eq!(evicted, vec!["unrelated".to_string(), "v1".to_string()]);
        assert!(!storage.has("v1").await.unwrap());
        assert!(storage.has("v2").await.unwrap());
        assert!(control.claimed.get());
    }

    #[tokio::test]
    async fn test_eviction_continues_past_undeletable_store() {
        let storage = Rc::new(MemoryCacheStorage::new());
        storage.open("a-old").await.unwrap();
        storage.open("b-old").await.unwrap();
        storage.open("c-old").await.unwrap();
        storage.open("v3").await.unwrap();
        storage.lock_store("b-old");

        let store = CacheStore::new(storage.clone(), CacheVersion::new("v3"));
        let control = FakeControl::default();

        let evicted = activate(&store, &control).await.unwrap();

        assert_eq!(evicted, vec!["a-old".to_string(), "c-old".to_string()]);
        assert!(storage.has("b-old").await.unwrap());
        assert!(!storage.has("c-old").await.unwrap());
        assert!(storage.has("v3").await.unwrap());
        assert!(control.claimed.get());
    }

    #[tokio::test]
    async fn test_store_rejects_unqualified_responses() {
        let storage = Rc::new(MemoryCacheStorage::new());
        let store = CacheStore::new(storage.clone(), CacheVersion::new("v1"));
        let request = Request::get(scope().resolve("/cdn.png").unwrap());

        assert!(!store.store(&request, Response::opaque()).await.unwrap());
        let cors = Response::new(200, "x").with_type(ResponseType::Cors);
        assert!(!store.store(&request, cors).await.unwrap());
        assert!(!store.store(&request, Response::new(500, "x")).await.unwrap());
        assert_eq!(store.lookup(&request).await.unwrap(), None);

        assert!(store.store(&request, Response::new(200, "ok")).await.unwrap());
        assert!(store.lookup(&request).await.unwrap().is_some());
    }
}
