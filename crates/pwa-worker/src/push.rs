//! Push message to displayed notification.

use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pwa_core::{NotificationAction, NotificationDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WorkerError;

/// An inbound push event.
#[derive(Debug, Clone)]
pub struct PushEvent {
    /// Raw message body, if the push carried one.
    pub data: Option<Vec<u8>>,
    /// When the event reached the worker.
    pub received_at: DateTime<Utc>,
}

impl PushEvent {
    /// Create an event received at the given instant.
    pub fn new(data: Option<Vec<u8>>, received_at: DateTime<Utc>) -> Self {
        Self { data, received_at }
    }
}

/// Fields a push message may carry. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}

impl NotificationPayload {
    /// Parse a push body. Missing, non-JSON or non-object bodies yield an empty
    /// payload; fields that are not non-blank strings are dropped individually.
    pub fn parse(data: Option<&[u8]>) -> Self {
        let Some(bytes) = data else {
            return Self::default();
        };

        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "push payload is not JSON, using defaults");
                return Self::default();
            }
        };
        let Value::Object(fields) = value else {
            warn!("push payload is not a JSON object, using defaults");
            return Self::default();
        };

        let field = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            title: field("title"),
            body: field("body"),
            url: field("url"),
            icon: field("icon"),
        }
    }

    /// Fill every absent field from `defaults`.
    pub fn normalize(
        self,
        defaults: &NotificationDefaults,
        received_at: DateTime<Utc>,
    ) -> NotificationRequest {
        NotificationRequest {
            title: self.title.unwrap_or_else(|| defaults.title.clone()),
            options: NotificationOptions {
                body: self.body.unwrap_or_else(|| defaults.body.clone()),
                icon: self.icon.unwrap_or_else(|| defaults.icon.clone()),
                badge: defaults.badge.clone(),
                vibrate: defaults.vibrate.clone(),
                tag: timestamp_tag(received_at),
                require_interaction: defaults.require_interaction,
                actions: defaults.actions.clone(),
                data: NotificationData {
                    url: self.url.unwrap_or_else(|| defaults.url.clone()),
                },
            },
        }
    }
}

/// Tag unique per arrival so successive notifications stack.
pub fn timestamp_tag(received_at: DateTime<Utc>) -> String {
    format!("notification-{}", received_at.timestamp_millis())
}

/// Data stored on a displayed notification for click routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Where a click navigates.
    pub url: String,
}

/// Options in the platform's `showNotification` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

/// A fully populated notification ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub options: NotificationOptions,
}

/// The platform's notification display.
#[async_trait(?Send)]
pub trait Notifier {
    /// Show a notification; resolves once it is displayed.
    async fn show(&self, notification: &NotificationRequest) -> Result<(), String>;
}

/// Turns push events into displayed notifications.
#[derive(Clone)]
pub struct PushReceiver {
    defaults: Rc<NotificationDefaults>,
    notifier: Rc<dyn Notifier>,
}

impl PushReceiver {
    /// Create a receiver.
    pub fn new(defaults: Rc<NotificationDefaults>, notifier: Rc<dyn Notifier>) -> Self {
        Self { defaults, notifier }
    }

    /// Build the notification for an event without showing it.
    pub fn prepare(&self, event: &PushEvent) -> NotificationRequest {
        NotificationPayload::parse(event.data.as_deref()).normalize(&self.defaults, event.received_at)
    }

    /// Show the notification for an event. The event must stay alive until this resolves.
    pub async fn receive(&self, event: PushEvent) -> Result<NotificationRequest, WorkerError> {
        let notification = self.prepare(&event);
        debug!(tag = %notification.options.tag, url = %notification.options.data.url, "showing notification");

        self.notifier
            .show(&notification)
            .await
            .map_err(WorkerError::Notification)?;

        info!(tag = %notification.options.tag, "notification shown");
        Ok(notification)
    }
}
