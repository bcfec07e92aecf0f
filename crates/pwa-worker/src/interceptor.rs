//! Per-request fetch strategies.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use pwa_cache::{Admission, CacheStore};
use pwa_core::{Network, NetworkError, Request, Response, Scope, WorkerConfig};
use pwa_observability::OutcomeCounters;
use tracing::{debug, warn};

use crate::error::WorkerError;
use crate::offline::offline_response;
use crate::route::{classify, Route};
use crate::spawn::Spawner;

/// Outcome of intercepting one request.
pub enum Interception {
    /// Leave the request to the platform's default fetch.
    Passthrough,
    /// Answer with this future. An error means nothing could be served.
    Respond(LocalBoxFuture<'static, Result<Response, NetworkError>>),
}

impl std::fmt::Debug for Interception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passthrough => f.write_str("Passthrough"),
            Self::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

/// Strategy dispatcher in front of the network.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct FetchInterceptor {
    config: Rc<WorkerConfig>,
    scope: Scope,
    store: CacheStore,
    network: Rc<dyn Network>,
    spawner: Rc<dyn Spawner>,
    metrics: Rc<OutcomeCounters>,
}

impl FetchInterceptor {
    /// Create an interceptor.
    pub fn new(
        config: Rc<WorkerConfig>,
        scope: Scope,
        store: CacheStore,
        network: Rc<dyn Network>,
        spawner: Rc<dyn Spawner>,
        metrics: Rc<OutcomeCounters>,
    ) -> Self {
        Self {
            config,
            scope,
            store,
            network,
            spawner,
            metrics,
        }
    }

    /// Route a request without running it.
    pub fn plan(&self, request: &Request) -> Result<Route, WorkerError> {
        match request.url.scheme() {
            "http" | "https" => Ok(classify(request, &self.config)),
            other => Err(WorkerError::Interceptor(format!(
                "unsupported scheme {:?}",
                other
            ))),
        }
    }

    /// Decide how to answer a request.
    ///
    /// A fault while planning is never surfaced: the request passes through.
    pub fn intercept(&self, request: Request) -> Interception {
        let route = match self.plan(&request) {
            Ok(route) => route,
            Err(e) => {
                warn!(url = %request.url, error = %e, "interceptor fault, passing through");
                self.metrics.record("bypass", "fault");
                return Interception::Passthrough;
            }
        };

        debug!(url = %request.url, route = %route, "fetch routed");
        if !route.intercepts() {
            self.metrics.record(route.name(), "passthrough");
            return Interception::Passthrough;
        }

        let this = self.clone();
        Interception::Respond(Box::pin(async move { this.respond(&request, &route).await }))
    }

    /// Run the strategy for an intercepted route.
    pub async fn respond(&self, request: &Request, route: &Route) -> Result<Response, NetworkError> {
        match route {
            Route::Bypass(_) => self.network.fetch(request).await,
            Route::Navigation => Ok(self.navigation(request).await),
            Route::NetworkFirst => self.network_first(request).await,
            Route::CacheFirst => self.cache_first(request).await,
        }
    }

    /// Network, else the first cached navigation fallback, else the offline page.
    async fn navigation(&self, request: &Request) -> Response {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.metrics.record("navigation", "network");
                return response;
            }
            Err(e) => e,
        };
        debug!(url = %request.url, error = %error, "navigation offline");

        for path in &self.config.navigation_fallbacks {
            let url = match self.scope.resolve(path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(path = %path, error = %e, "unusable navigation fallback");
                    continue;
                }
            };
            if let Some(shell) = self.lookup(&Request::get(url)).await {
                self.metrics.record("navigation", "shell");
                return shell;
            }
        }

        self.metrics.record("navigation", "offline_page");
        offline_response(&self.config.offline_page)
    }

    /// Network, else cache. Never synthesizes.
    async fn network_first(&self, request: &Request) -> Result<Response, NetworkError> {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.metrics.record("network_first", "network");
                return Ok(response);
            }
            Err(e) => e,
        };

        match self.lookup(request).await {
            Some(cached) => {
                self.metrics.record("network_first", "cache");
                Ok(cached)
            }
            None => {
                self.metrics.record("network_first", "failed");
                Err(error)
            }
        }
    }

    /// Cache, else network with detached write-through.
    async fn cache_first(&self, request: &Request) -> Result<Response, NetworkError> {
        if let Some(cached) = self.lookup(request).await {
            self.metrics.record("cache_first", "hit");
            return Ok(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.metrics.record("cache_first", "network");
                if Admission::check(&response).is_admitted() {
                    self.write_through(request.clone(), response.clone());
                }
                Ok(response)
            }
            Err(error) => {
                // A concurrent fetch may have written the entry meanwhile.
                match self.lookup(request).await {
                    Some(cached) => {
                        self.metrics.record("cache_first", "hit");
                        Ok(cached)
                    }
                    None => {
                        self.metrics.record("cache_first", "failed");
                        Err(error)
                    }
                }
            }
        }
    }

    fn write_through(&self, request: Request, response: Response) {
        let store = self.store.clone();
        let metrics = self.metrics.clone();
        self.spawner.spawn_local(Box::pin(async move {
            match store.store(&request, response).await {
                Ok(true) => metrics.record("cache_first", "write_through"),
                Ok(false) => {}
                Err(e) => warn!(url = %request.url, error = %e, "cache write failed"),
            }
        }));
    }

    /// Cache lookup where a storage error counts as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.store.lookup(request).await {
            Ok(found) => found,
            Err(e) => {
                warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }
}
