//! Browser push manager and permission bindings.

use async_trait::async_trait;
use js_sys::{Reflect, Uint8Array};
use pwa_push::{
    Capabilities, PermissionState, PushError, PushManager, PushPlatform, PushSubscription,
    SubscriptionOptions,
};
use wasm_bindgen::{JsCast, JsValue};

use crate::convert::{js_error, resolve};

fn platform_error(e: String) -> PushError {
    PushError::Platform(e)
}

/// Convert a browser subscription, keeping its creation options.
pub fn from_web_subscription(subscription: &web_sys::PushSubscription) -> Result<PushSubscription, PushError> {
    let to_json: js_sys::Function = Reflect::get(subscription, &JsValue::from_str("toJSON"))
        .and_then(|f| f.dyn_into())
        .map_err(|e| platform_error(js_error(e)))?;
    let json = to_json
        .call0(subscription)
        .map_err(|e| platform_error(js_error(e)))?;

    let mut converted: PushSubscription =
        serde_wasm_bindgen::from_value(json).map_err(|e| platform_error(e.to_string()))?;

    let options = subscription.options();
    converted.options = SubscriptionOptions {
        user_visible_only: options.user_visible_only(),
        application_server_key: options
            .application_server_key()
            .ok()
            .flatten()
            .map(|key| Uint8Array::new(&key).to_vec()),
    };
    Ok(converted)
}

/// Where the registration comes from.
#[derive(Clone)]
enum Registration {
    /// Inside the worker: its own registration.
    Worker(web_sys::ServiceWorkerRegistration),
    /// In a page: `navigator.serviceWorker.ready`.
    Page,
}

/// The registration's push manager, plus notification permission on pages.
#[derive(Clone)]
pub struct BrowserPush {
    registration: Registration,
}

impl BrowserPush {
    /// Push manager of the running worker.
    pub fn for_worker(registration: web_sys::ServiceWorkerRegistration) -> Self {
        Self {
            registration: Registration::Worker(registration),
        }
    }

    /// Push manager reached from a page.
    pub fn for_page() -> Self {
        Self {
            registration: Registration::Page,
        }
    }

    async fn registration(&self) -> Result<web_sys::ServiceWorkerRegistration, PushError> {
        match &self.registration {
            Registration::Worker(registration) => Ok(registration.clone()),
            Registration::Page => {
                let window = web_sys::window().ok_or(PushError::Unsupported)?;
                let ready = window
                    .navigator()
                    .service_worker()
                    .ready()
                    .map_err(|e| platform_error(js_error(e)))?;
                resolve(ready)
                    .await
                    .map_err(platform_error)?
                    .dyn_into()
                    .map_err(|e| platform_error(js_error(e)))
            }
        }
    }

    async fn manager(&self) -> Result<web_sys::PushManager, PushError> {
        self.registration()
            .await?
            .push_manager()
            .map_err(|e| platform_error(js_error(e)))
    }
}

#[async_trait(?Send)]
impl PushManager for BrowserPush {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PushError> {
        match self.current().await? {
            Some(current) => from_web_subscription(&current).map(Some),
            None => Ok(None),
        }
    }

    async fn subscribe(&self, options: &SubscriptionOptions) -> Result<PushSubscription, PushError> {
        let init = web_sys::PushSubscriptionOptionsInit::new();
        init.set_user_visible_only(options.user_visible_only);
        if let Some(key) = &options.application_server_key {
            Reflect::set(
                &init,
                &JsValue::from_str("applicationServerKey"),
                &Uint8Array::from(key.as_slice()),
            )
            .map_err(|e| platform_error(js_error(e)))?;
        }

        let promise = self
            .manager()
            .await?
            .subscribe_with_options(&init)
            .map_err(|e| platform_error(js_error(e)))?;
        let value = resolve(promise).await.map_err(platform_error)?;
        from_web_subscription(value.unchecked_ref())
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError> {
        let Some(current) = self.current().await? else {
            return Ok(false);
        };
        if current.endpoint() != subscription.endpoint {
            return Ok(false);
        }
        let promise = current
            .unsubscribe()
            .map_err(|e| platform_error(js_error(e)))?;
        let value = resolve(promise).await.map_err(platform_error)?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

impl BrowserPush {
    async fn current(&self) -> Result<Option<web_sys::PushSubscription>, PushError> {
        let promise = self
            .manager()
            .await?
            .get_subscription()
            .map_err(|e| platform_error(js_error(e)))?;
        let value = resolve(promise).await.map_err(platform_error)?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        Ok(Some(value.unchecked_into()))
    }
}

fn has_property(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

#[async_trait(?Send)]
impl PushPlatform for BrowserPush {
    fn capabilities(&self) -> Capabilities {
        let Some(window) = web_sys::window() else {
            return Capabilities::none();
        };
        Capabilities {
            service_worker: has_property(&window.navigator(), "serviceWorker"),
            push_manager: has_property(&window, "PushManager"),
        }
    }

    fn permission(&self) -> PermissionState {
        match web_sys::Notification::permission() {
            web_sys::NotificationPermission::Granted => PermissionState::Granted,
            web_sys::NotificationPermission::Denied => PermissionState::Denied,
            _ => PermissionState::Default,
        }
    }

    async fn request_permission(&self) -> Result<PermissionState, PushError> {
        let promise = web_sys::Notification::request_permission()
            .map_err(|e| platform_error(js_error(e)))?;
        let value = resolve(promise).await.map_err(platform_error)?;
        Ok(value
            .as_string()
            .map(|decision| PermissionState::from_platform(&decision))
            .unwrap_or_default())
    }
}
