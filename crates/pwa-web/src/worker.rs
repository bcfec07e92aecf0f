//! Worker entry point: binds platform events to the dispatch table.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use js_sys::Reflect;
use pwa_core::{AppConfig, Network, Scope};
use pwa_push::{HttpServerSync, PushManager, ServerSync, SubscriptionChange};
use pwa_worker::{Intent, NotificationClick, PushEvent, ServiceWorker, WorkerEvent, WorkerServices};
use tracing::{debug, error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

use crate::console;
use crate::convert::{from_web_request, js_error, to_web_response};
use crate::platform::{
    BrowserCacheStorage, BrowserClients, BrowserControl, BrowserNetwork, BrowserNotification,
    BrowserNotifier, LocalSpawner,
};
use crate::push::{from_web_subscription, BrowserPush};

/// Register the worker's listeners. Call once from the worker script.
///
/// `config` is an optional `AppConfig` object; absent fields take their defaults.
#[wasm_bindgen(js_name = startWorker)]
pub fn start_worker(config: JsValue) -> Result<(), JsValue> {
    console::init("info");

    let config: AppConfig = if config.is_undefined() || config.is_null() {
        AppConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let global: web_sys::ServiceWorkerGlobalScope = js_sys::global().dyn_into()?;
    let registration = global.registration();
    let scope = Scope::parse(&registration.scope()).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let network: Rc<dyn Network> = Rc::new(BrowserNetwork);
    let push_manager: Rc<dyn PushManager> = Rc::new(BrowserPush::for_worker(registration.clone()));
    let server: Rc<dyn ServerSync> = Rc::new(HttpServerSync::new(
        network.clone(),
        scope.clone(),
        config.push.clone(),
    ));

    let services = WorkerServices {
        network,
        storage: Rc::new(BrowserCacheStorage::new(global.caches()?)),
        control: Rc::new(BrowserControl::new(global.clone())),
        spawner: Rc::new(LocalSpawner),
        notifier: Rc::new(BrowserNotifier::new(registration)),
        clients: Rc::new(BrowserClients::new(global.clients())),
        push_manager,
        server,
    };

    info!(version = %config.worker.cache_version, scope = %scope.base(), "starting worker");
    let worker = Rc::new(ServiceWorker::new(
        config.worker,
        config.push,
        scope.clone(),
        services,
    ));

    for kind in ["install", "activate"] {
        let worker = worker.clone();
        listen(&global, kind, move |event| {
            let intent = if kind == "install" {
                worker.dispatch(WorkerEvent::Install)
            } else {
                worker.dispatch(WorkerEvent::Activate)
            };
            apply(intent, &event);
        })?;
    }

    let fetch_worker = worker.clone();
    listen(&global, "fetch", move |event| {
        let fetch: &web_sys::FetchEvent = event.unchecked_ref();
        let request = match from_web_request(&fetch.request()) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "request not convertible, passing through");
                return;
            }
        };
        // Cross-origin responses are never cached and opaque ones cannot be rebuilt.
        if !scope.is_same_origin(&request.url) {
            return;
        }
        apply(fetch_worker.dispatch(WorkerEvent::Fetch(request)), &event);
    })?;

    let push_worker = worker.clone();
    listen(&global, "push", move |event| {
        let push: &web_sys::PushEvent = event.unchecked_ref();
        let data = push.data().map(|data| data.text().into_bytes());
        let received_at = DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64)
            .unwrap_or_default();
        apply(
            push_worker.dispatch(WorkerEvent::Push(PushEvent::new(data, received_at))),
            &event,
        );
    })?;

    let click_worker = worker.clone();
    listen(&global, "notificationclick", move |event| {
        let click: &web_sys::NotificationEvent = event.unchecked_ref();
        let notification = Rc::new(BrowserNotification::new(click.notification()));
        let click = NotificationClick::action(click.action(), notification);
        apply(click_worker.dispatch(WorkerEvent::NotificationClick(click)), &event);
    })?;

    listen(&global, "pushsubscriptionchange", move |event| {
        let change = SubscriptionChange {
            old_subscription: subscription_field(&event, "oldSubscription"),
            new_subscription: subscription_field(&event, "newSubscription"),
        };
        apply(worker.dispatch(WorkerEvent::SubscriptionChange(change)), &event);
    })?;

    Ok(())
}

fn listen(
    global: &web_sys::ServiceWorkerGlobalScope,
    kind: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    global.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the worker.
    closure.forget();
    Ok(())
}

fn subscription_field(event: &web_sys::Event, name: &str) -> Option<pwa_push::PushSubscription> {
    let value = Reflect::get(event, &JsValue::from_str(name)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    match from_web_subscription(value.unchecked_ref()) {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            error!(field = name, error = %e, "unreadable subscription on change event");
            None
        }
    }
}

/// Carry out an intent on the originating event.
fn apply(intent: Intent, event: &web_sys::Event) {
    match intent {
        Intent::Passthrough => {}
        Intent::RespondWith(response) => {
            let promise = future_to_promise(async move {
                let response = response
                    .await
                    .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))?;
                to_web_response(&response)
                    .map(JsValue::from)
                    .map_err(|e| JsValue::from(js_sys::Error::new(&e)))
            });
            let fetch: &web_sys::FetchEvent = event.unchecked_ref();
            if let Err(e) = fetch.respond_with(&promise) {
                error!(error = %js_error(e), "respondWith rejected");
            }
        }
        Intent::WaitUntil(work) => {
            let promise = future_to_promise(async move {
                work.await;
                Ok(JsValue::UNDEFINED)
            });
            let extendable: &web_sys::ExtendableEvent = event.unchecked_ref();
            if let Err(e) = extendable.wait_until(&promise) {
                error!(error = %js_error(e), "waitUntil rejected");
            }
        }
    }
}
