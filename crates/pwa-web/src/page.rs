//! Page-side push subscription controller.

use std::rc::Rc;

use js_sys::Promise;
use pwa_core::{PushConfig, Scope};
use pwa_push::{
    AutoOutcome, AutoSubscribe, ControllerHandle, HttpServerSync, SkipReason, SubscriptionController,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::console;
use crate::platform::BrowserNetwork;
use crate::push::BrowserPush;

type Handle = ControllerHandle<BrowserPush, HttpServerSync<BrowserNetwork>>;

#[derive(Serialize)]
struct AutoResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<AutoOutcome> for AutoResult {
    fn from(outcome: AutoOutcome) -> Self {
        match outcome {
            AutoOutcome::Skipped(reason) => Self {
                status: "skipped",
                reason: Some(skip_reason(reason)),
                registered: None,
                error: None,
            },
            AutoOutcome::Subscribed { registered } => Self {
                status: "subscribed",
                reason: None,
                registered: Some(registered),
                error: None,
            },
            AutoOutcome::Failed(e) => Self {
                status: "failed",
                reason: None,
                registered: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NotEnabled => "not_enabled",
        SkipReason::NotAuthenticated => "not_authenticated",
        SkipReason::Unsupported => "unsupported",
        SkipReason::AlreadyAttempted => "already_attempted",
        SkipReason::PermissionDenied => "permission_denied",
    }
}

/// Push subscription controls for the application UI.
#[wasm_bindgen]
pub struct PushController {
    handle: Rc<Handle>,
}

#[wasm_bindgen]
impl PushController {
    /// `config` is an optional push configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<PushController, JsValue> {
        console::init("info");

        let config: PushConfig = if config.is_undefined() || config.is_null() {
            PushConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let origin = window.location().origin()?;
        let scope = Scope::parse(&origin).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let sync = HttpServerSync::new(BrowserNetwork, scope, config.clone());
        let controller = SubscriptionController::new(BrowserPush::for_page(), sync, config);
        Ok(Self {
            handle: Rc::new(ControllerHandle::new(controller)),
        })
    }

    /// `{ supported, permission, subscribed, loading }`.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.handle.state())?)
    }

    /// Re-read permission and subscription from the platform.
    pub fn refresh(&self) -> Promise {
        let refresh = self.handle.clone().refresh();
        future_to_promise(async move {
            refresh.await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Attempt the one automatic subscription of this page load.
    #[wasm_bindgen(js_name = autoSubscribe)]
    pub fn auto_subscribe(&self, enabled: bool, authenticated: bool) -> Promise {
        let attempt = self.handle.clone().auto_subscribe(AutoSubscribe {
            enabled,
            authenticated,
        });
        future_to_promise(async move {
            let outcome = attempt.await;
            Ok(serde_wasm_bindgen::to_value(&AutoResult::from(outcome))?)
        })
    }

    /// Resolves to whether a subscription now exists. Waits for any running operation.
    pub fn subscribe(&self) -> Promise {
        let subscribe = self.handle.clone().subscribe();
        future_to_promise(async move { Ok(JsValue::from_bool(subscribe.await)) })
    }

    /// Resolves to whether the server and platform both confirmed removal.
    pub fn unsubscribe(&self) -> Promise {
        let unsubscribe = self.handle.clone().unsubscribe();
        future_to_promise(async move { Ok(JsValue::from_bool(unsubscribe.await)) })
    }
}
