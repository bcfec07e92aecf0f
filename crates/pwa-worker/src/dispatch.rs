//! Event dispatch table.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use pwa_cache::{activate, install, CacheStorage, CacheStore, WorkerControl};
use pwa_core::{Network, NetworkError, PushConfig, Request, Response, Scope, WorkerConfig};
use pwa_observability::{event_span, EventId, OutcomeCounters};
use pwa_push::{resubscribe, PushManager, ServerSync, SubscriptionChange};
use tracing::{error, info, warn, Instrument};

use crate::interceptor::{FetchInterceptor, Interception};
use crate::push::{Notifier, PushEvent, PushReceiver};
use crate::router::{Clients, NotificationClick, NotificationRouter};
use crate::spawn::Spawner;

/// A platform event delivered to the worker.
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(PushEvent),
    NotificationClick(NotificationClick),
    SubscriptionChange(SubscriptionChange),
}

impl WorkerEvent {
    /// The platform's event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Push(_) => "push",
            Self::NotificationClick(_) => "notificationclick",
            Self::SubscriptionChange(_) => "pushsubscriptionchange",
        }
    }
}

/// What the adapter must do with the event.
pub enum Intent {
    /// Answer the fetch with this future.
    RespondWith(LocalBoxFuture<'static, Result<Response, NetworkError>>),
    /// Do not intercept; the platform fetches normally.
    Passthrough,
    /// Keep the worker alive until this completes.
    WaitUntil(LocalBoxFuture<'static, ()>),
}

impl Intent {
    /// Variant name, for logs and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RespondWith(_) => "respond_with",
            Self::Passthrough => "passthrough",
            Self::WaitUntil(_) => "wait_until",
        }
    }
}

impl std::fmt::Debug for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Platform facilities the worker runs against.
#[derive(Clone)]
pub struct WorkerServices {
    pub network: Rc<dyn Network>,
    pub storage: Rc<dyn CacheStorage>,
    pub control: Rc<dyn WorkerControl>,
    pub spawner: Rc<dyn Spawner>,
    pub notifier: Rc<dyn Notifier>,
    pub clients: Rc<dyn Clients>,
    pub push_manager: Rc<dyn PushManager>,
    pub server: Rc<dyn ServerSync>,
}

/// The background worker: one handler per event kind.
///
/// Configuration is fixed at construction.
pub struct ServiceWorker {
    config: Rc<WorkerConfig>,
    push_config: Rc<PushConfig>,
    scope: Scope,
    store: CacheStore,
    services: WorkerServices,
    interceptor: FetchInterceptor,
    receiver: PushReceiver,
    router: NotificationRouter,
    metrics: Rc<OutcomeCounters>,
}

impl ServiceWorker {
    /// Wire the handlers.
    pub fn new(
        config: WorkerConfig,
        push_config: PushConfig,
        scope: Scope,
        services: WorkerServices,
    ) -> Self {
        let config = Rc::new(config);
        let metrics = Rc::new(OutcomeCounters::new());
        let store = CacheStore::new(services.storage.clone(), config.cache_version.clone());

        let interceptor = FetchInterceptor::new(
            config.clone(),
            scope.clone(),
            store.clone(),
            services.network.clone(),
            services.spawner.clone(),
            metrics.clone(),
        );
        let receiver = PushReceiver::new(
            Rc::new(config.notifications.clone()),
            services.notifier.clone(),
        );
        let router = NotificationRouter::new(scope.clone(), services.clients.clone());

        Self {
            config,
            push_config: Rc::new(push_config),
            scope,
            store,
            services,
            interceptor,
            receiver,
            router,
            metrics,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get the current-version store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Get the fetch interceptor.
    pub fn interceptor(&self) -> &FetchInterceptor {
        &self.interceptor
    }

    /// Get the strategy counters.
    pub fn metrics(&self) -> &OutcomeCounters {
        &self.metrics
    }

    /// Map an event to its intent.
    pub fn dispatch(&self, event: WorkerEvent) -> Intent {
        let id = EventId::next(event.kind());
        let span = event_span(event.kind(), &id);

        match event {
            WorkerEvent::Install => Intent::WaitUntil(Box::pin(self.on_install().instrument(span))),
            WorkerEvent::Activate => {
                Intent::WaitUntil(Box::pin(self.on_activate().instrument(span)))
            }
            WorkerEvent::Fetch(request) => {
                let _entered = span.enter();
                match self.interceptor.intercept(request) {
                    Interception::Passthrough => Intent::Passthrough,
                    Interception::Respond(response) => {
                        Intent::RespondWith(Box::pin(response.instrument(span.clone())))
                    }
                }
            }
            WorkerEvent::Push(push) => {
                let receiver = self.receiver.clone();
                Intent::WaitUntil(Box::pin(
                    async move {
                        if let Err(e) = receiver.receive(push).await {
                            error!(error = %e, "failed to show notification");
                        }
                    }
                    .instrument(span),
                ))
            }
            WorkerEvent::NotificationClick(click) => {
                let router = self.router.clone();
                Intent::WaitUntil(Box::pin(
                    async move {
                        if let Err(e) = router.route(click).await {
                            warn!(error = %e, "notification click not routed");
                        }
                    }
                    .instrument(span),
                ))
            }
            WorkerEvent::SubscriptionChange(change) => {
                Intent::WaitUntil(Box::pin(self.on_subscription_change(change).instrument(span)))
            }
        }
    }

    fn on_install(&self) -> impl std::future::Future<Output = ()> + 'static {
        let store = self.store.clone();
        let control = self.services.control.clone();
        let network = self.services.network.clone();
        let scope = self.scope.clone();
        let config = self.config.clone();
        async move {
            install(
                &store,
                control.as_ref(),
                network.as_ref(),
                &scope,
                &config.shell_resources,
            )
            .await;
        }
    }

    fn on_activate(&self) -> impl std::future::Future<Output = ()> + 'static {
        let store = self.store.clone();
        let control = self.services.control.clone();
        async move {
            match activate(&store, control.as_ref()).await {
                Ok(evicted) => info!(version = %store.version(), evicted = evicted.len(), "activated"),
                Err(e) => warn!(error = %e, "stale cache eviction failed"),
            }
        }
    }

    fn on_subscription_change(
        &self,
        change: SubscriptionChange,
    ) -> impl std::future::Future<Output = ()> + 'static {
        let manager = self.services.push_manager.clone();
        let server = self.services.server.clone();
        let push_config = self.push_config.clone();
        async move {
            if let Err(e) =
                resubscribe(manager.as_ref(), server.as_ref(), &change, &push_config).await
            {
                error!(error = %e, "push re-subscription failed");
            }
        }
    }
}
