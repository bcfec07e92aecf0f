//! Browser implementations of the worker seams.

use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use js_sys::Array;
use pwa_cache::{Cache, CacheError, CacheResult, CacheStorage, WorkerControl};
use pwa_core::{Network, NetworkError, Request, Response};
use pwa_worker::{Clients, DisplayedNotification, NotificationRequest, Notifier, Spawner, WindowClient};
use url::Url;
use wasm_bindgen::JsCast;

use crate::convert::{
    as_web_response, from_web_response, js_error, js_string, resolve, to_web_request,
    to_web_response,
};

/// Fetch through the global scope (worker or window).
pub struct BrowserNetwork;

#[async_trait(?Send)]
impl Network for BrowserNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let web_request = to_web_request(request).map_err(NetworkError::Request)?;

        let global = js_sys::global();
        let promise = if let Some(scope) = global.dyn_ref::<web_sys::WorkerGlobalScope>() {
            scope.fetch_with_request(&web_request)
        } else if let Some(window) = global.dyn_ref::<web_sys::Window>() {
            window.fetch_with_request(&web_request)
        } else {
            return Err(NetworkError::Request("no fetch in this global scope".to_string()));
        };

        let value = resolve(promise).await.map_err(NetworkError::Connection)?;
        let response = as_web_response(value)
            .ok_or_else(|| NetworkError::Decode("fetch did not resolve to a Response".to_string()))?;
        from_web_response(response).await.map_err(NetworkError::Decode)
    }
}

fn storage_error(e: String) -> CacheError {
    CacheError::Storage(e)
}

/// One named browser cache.
pub struct BrowserCache {
    inner: web_sys::Cache,
}

#[async_trait(?Send)]
impl Cache for BrowserCache {
    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        let web_request = to_web_request(request).map_err(storage_error)?;
        let value = resolve(self.inner.match_with_request(&web_request))
            .await
            .map_err(storage_error)?;
        match as_web_response(value) {
            Some(response) => from_web_response(response).await.map(Some).map_err(storage_error),
            None => Ok(None),
        }
    }

    async fn put(&self, request: &Request, response: Response) -> CacheResult<()> {
        let web_request = to_web_request(request).map_err(storage_error)?;
        let web_response = to_web_response(&response).map_err(storage_error)?;
        resolve(self.inner.put_with_request(&web_request, &web_response))
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

/// The origin's cache storage.
pub struct BrowserCacheStorage {
    inner: web_sys::CacheStorage,
}

impl BrowserCacheStorage {
    pub fn new(inner: web_sys::CacheStorage) -> Self {
        Self { inner }
    }
}

#[async_trait(?Send)]
impl CacheStorage for BrowserCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Rc<dyn Cache>> {
        let value = resolve(self.inner.open(name))
            .await
            .map_err(|reason| CacheError::Open {
                name: name.to_string(),
                reason,
            })?;
        let inner: web_sys::Cache = value.dyn_into().map_err(|e| CacheError::Open {
            name: name.to_string(),
            reason: js_error(e),
        })?;
        let cache: Rc<dyn Cache> = Rc::new(BrowserCache { inner });
        Ok(cache)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        let value = resolve(self.inner.has(name)).await.map_err(storage_error)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let value = resolve(self.inner.keys()).await.map_err(storage_error)?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let value = resolve(self.inner.delete(name)).await.map_err(storage_error)?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

/// Lifecycle controls of the worker global scope.
pub struct BrowserControl {
    scope: web_sys::ServiceWorkerGlobalScope,
}

impl BrowserControl {
    pub fn new(scope: web_sys::ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl WorkerControl for BrowserControl {
    async fn skip_waiting(&self) -> Result<(), String> {
        let promise = self.scope.skip_waiting().map_err(js_error)?;
        resolve(promise).await.map(|_| ())
    }

    async fn claim_clients(&self) -> Result<(), String> {
        resolve(self.scope.clients().claim()).await.map(|_| ())
    }
}

/// `registration.showNotification`.
pub struct BrowserNotifier {
    registration: web_sys::ServiceWorkerRegistration,
}

impl BrowserNotifier {
    pub fn new(registration: web_sys::ServiceWorkerRegistration) -> Self {
        Self { registration }
    }
}

#[async_trait(?Send)]
impl Notifier for BrowserNotifier {
    async fn show(&self, notification: &NotificationRequest) -> Result<(), String> {
        let options: web_sys::NotificationOptions = serde_wasm_bindgen::to_value(&notification.options)
            .map_err(|e| e.to_string())?
            .unchecked_into();
        let promise = self
            .registration
            .show_notification_with_options(&notification.title, &options)
            .map_err(js_error)?;
        resolve(promise).await.map(|_| ())
    }
}

/// A browser window client.
pub struct BrowserWindow {
    inner: web_sys::WindowClient,
}

#[async_trait(?Send)]
impl WindowClient for BrowserWindow {
    fn url(&self) -> String {
        self.inner.url()
    }

    async fn navigate(&self, url: &Url) -> Result<(), String> {
        let promise = self.inner.navigate(url.as_str()).map_err(js_error)?;
        resolve(promise).await.map(|_| ())
    }

    async fn focus(&self) -> Result<(), String> {
        let promise = self.inner.focus().map_err(js_error)?;
        resolve(promise).await.map(|_| ())
    }
}

/// `self.clients`.
pub struct BrowserClients {
    inner: web_sys::Clients,
}

impl BrowserClients {
    pub fn new(inner: web_sys::Clients) -> Self {
        Self { inner }
    }
}

#[async_trait(?Send)]
impl Clients for BrowserClients {
    async fn windows(&self) -> Result<Vec<Rc<dyn WindowClient>>, String> {
        let options = web_sys::ClientQueryOptions::new();
        options.set_type(web_sys::ClientType::Window);
        options.set_include_uncontrolled(true);

        let value = resolve(self.inner.match_all_with_options(&options)).await?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|client| client.dyn_into::<web_sys::WindowClient>().ok())
            .map(|inner| {
                let window: Rc<dyn WindowClient> = Rc::new(BrowserWindow { inner });
                window
            })
            .collect())
    }

    async fn open_window(&self, url: &Url) -> Result<(), String> {
        resolve(self.inner.open_window(url.as_str())).await.map(|_| ())
    }
}

/// The notification attached to a click event.
pub struct BrowserNotification {
    inner: web_sys::Notification,
}

impl BrowserNotification {
    pub fn new(inner: web_sys::Notification) -> Self {
        Self { inner }
    }
}

impl DisplayedNotification for BrowserNotification {
    fn close(&self) {
        self.inner.close();
    }

    fn target_url(&self) -> Option<String> {
        let data = self.inner.data();
        if data.is_undefined() || data.is_null() {
            return None;
        }
        js_string(&data, "url")
    }
}

/// Detached tasks on the microtask queue.
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
