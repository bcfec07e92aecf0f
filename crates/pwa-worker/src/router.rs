//! Notification click to page focus or navigation.

use std::rc::Rc;

use async_trait::async_trait;
use pwa_core::Scope;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::WorkerError;

/// Action id that dismisses without navigating.
pub const CLOSE_ACTION: &str = "close";

/// A displayed notification the user interacted with.
pub trait DisplayedNotification {
    /// Dismiss it.
    fn close(&self);

    /// The `data.url` stored when it was shown.
    fn target_url(&self) -> Option<String>;
}

/// An open window of this or another origin.
#[async_trait(?Send)]
pub trait WindowClient {
    /// Current URL of the window.
    fn url(&self) -> String;

    /// Navigate the window.
    async fn navigate(&self, url: &Url) -> Result<(), String>;

    /// Bring the window to the front.
    async fn focus(&self) -> Result<(), String>;
}

/// The worker's view of open windows.
#[async_trait(?Send)]
pub trait Clients {
    /// Every window client, including ones this worker does not control.
    async fn windows(&self) -> Result<Vec<Rc<dyn WindowClient>>, String>;

    /// Open a new window.
    async fn open_window(&self, url: &Url) -> Result<(), String>;
}

/// A notification interaction.
#[derive(Clone)]
pub struct NotificationClick {
    /// Action id; empty when the body was clicked.
    pub action: String,
    pub notification: Rc<dyn DisplayedNotification>,
}

impl NotificationClick {
    /// A click on the notification body.
    pub fn body(notification: Rc<dyn DisplayedNotification>) -> Self {
        Self {
            action: String::new(),
            notification,
        }
    }

    /// A click on an action button.
    pub fn action(action: impl Into<String>, notification: Rc<dyn DisplayedNotification>) -> Self {
        Self {
            action: action.into(),
            notification,
        }
    }
}

/// What the router did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The close action: nothing else happened.
    Dismissed,
    /// An existing same-origin window was navigated and focused.
    Focused(Url),
    /// A new window was opened.
    Opened(Url),
}

/// Routes notification clicks, preferring an existing window over a new one.
#[derive(Clone)]
pub struct NotificationRouter {
    scope: Scope,
    clients: Rc<dyn Clients>,
}

impl NotificationRouter {
    /// Create a router.
    pub fn new(scope: Scope, clients: Rc<dyn Clients>) -> Self {
        Self { scope, clients }
    }

    /// Resolve the stored target against the scope, defaulting to `/`.
    pub fn target(&self, notification: &dyn DisplayedNotification) -> Url {
        let stored = notification.target_url().unwrap_or_else(|| "/".to_string());
        match self.scope.resolve(&stored) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %stored, error = %e, "bad notification url, using scope root");
                self.scope.base().clone()
            }
        }
    }

    /// Handle one click. The notification is always closed first.
    pub async fn route(&self, click: NotificationClick) -> Result<RouteOutcome, WorkerError> {
        click.notification.close();
        if click.action == CLOSE_ACTION {
            debug!("notification dismissed");
            return Ok(RouteOutcome::Dismissed);
        }

        let target = self.target(click.notification.as_ref());
        let windows = self.clients.windows().await.map_err(WorkerError::Client)?;

        if let Some(client) = windows
            .iter()
            .find(|client| self.scope.is_same_origin_str(&client.url()))
        {
            match client.navigate(&target).await {
                Ok(()) => {
                    client.focus().await.map_err(WorkerError::Client)?;
                    info!(url = %target, "focused existing window");
                    return Ok(RouteOutcome::Focused(target));
                }
                Err(e) => warn!(error = %e, "navigating existing window failed, opening a new one"),
            }
        }

        self.clients
            .open_window(&target)
            .await
            .map_err(WorkerError::Client)?;
        info!(url = %target, "opened window");
        Ok(RouteOutcome::Opened(target))
    }
}
