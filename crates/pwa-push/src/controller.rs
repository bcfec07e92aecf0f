//! Foreground subscription controller.

use pwa_core::PushConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PushError;
use crate::platform::PushPlatform;
use crate::subscription::{
    decode_application_server_key, PermissionState, PushSubscription, SubscriptionOptions,
};
use crate::sync::ServerSync;

/// Observable controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionState {
    /// Worker and push facilities are both present. Fixed after construction.
    pub supported: bool,
    /// Last known notification permission.
    pub permission: PermissionState,
    /// A platform subscription is believed to exist.
    pub subscribed: bool,
    /// A manual subscribe/unsubscribe is in flight.
    pub loading: bool,
}

/// Inputs gating automatic subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoSubscribe {
    /// The embedding page opted in.
    pub enabled: bool,
    /// A user session exists.
    pub authenticated: bool,
}

/// Why automatic subscription did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotEnabled,
    NotAuthenticated,
    Unsupported,
    AlreadyAttempted,
    PermissionDenied,
}

/// Result of one `auto_subscribe` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoOutcome {
    /// Gates or permission prevented an attempt.
    Skipped(SkipReason),
    /// Subscribed; `registered` is whether the server was told (new subscriptions only).
    Subscribed { registered: bool },
    /// The attempt failed; the latch stays set.
    Failed(PushError),
}

/// When `ensure_subscription` informs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    Always,
    OnlyIfNew,
}

/// Owns the page's push permission and subscription state.
///
/// Errors never escape: every operation logs and folds its outcome into
/// `SubscriptionState`.
pub struct SubscriptionController<P, S> {
    platform: P,
    sync: S,
    config: PushConfig,
    state: SubscriptionState,
    auto_attempted: bool,
}

impl<P: PushPlatform, S: ServerSync> SubscriptionController<P, S> {
    /// Create a controller. Probes capabilities once; the result never changes.
    pub fn new(platform: P, sync: S, config: PushConfig) -> Self {
        let capabilities = platform.capabilities();
        let supported = capabilities.is_supported();
        let permission = if supported {
            platform.permission()
        } else {
            PermissionState::Default
        };
        debug!(
            service_worker = capabilities.service_worker,
            push_manager = capabilities.push_manager,
            permission = %permission,
            "push capabilities detected"
        );

        Self {
            platform,
            sync,
            config,
            state: SubscriptionState {
                supported,
                permission,
                subscribed: false,
                loading: false,
            },
            auto_attempted: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Whether the one-shot auto-subscribe latch is set.
    pub fn auto_attempted(&self) -> bool {
        self.auto_attempted
    }

    /// Get the platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Get the server client.
    pub fn sync(&self) -> &S {
        &self.sync
    }

    /// Re-read permission and subscription presence from the platform.
    pub async fn refresh(&mut self) {
        if !self.state.supported {
            return;
        }
        self.state.permission = self.platform.permission();
        self.state.subscribed = match self.platform.get_subscription().await {
            Ok(existing) => existing.is_some(),
            Err(e) => {
                warn!(error = %e, "failed to read push subscription");
                false
            }
        };
    }

    /// Subscribe without user action, at most once per controller.
    ///
    /// Never prompts once permission is denied. An existing subscription is
    /// reused and not re-registered, so a subscription whose registration
    /// failed on an earlier load stays unknown to the server until a manual
    /// `subscribe` registers it.
    pub async fn auto_subscribe(&mut self, gate: AutoSubscribe) -> AutoOutcome {
        if !gate.enabled {
            return AutoOutcome::Skipped(SkipReason::NotEnabled);
        }
        if !gate.authenticated {
            return AutoOutcome::Skipped(SkipReason::NotAuthenticated);
        }
        if !self.state.supported {
            return AutoOutcome::Skipped(SkipReason::Unsupported);
        }
        if self.auto_attempted {
            return AutoOutcome::Skipped(SkipReason::AlreadyAttempted);
        }
        self.auto_attempted = true;

        let mut permission = self.platform.permission();
        self.state.permission = permission;
        if permission == PermissionState::Denied {
            debug!("notification permission denied, skipping auto-subscribe");
            return AutoOutcome::Skipped(SkipReason::PermissionDenied);
        }
        if permission == PermissionState::Default {
            permission = match self.platform.request_permission().await {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(error = %e, "permission request failed");
                    return AutoOutcome::Failed(e);
                }
            };
            self.state.permission = permission;
        }
        if permission != PermissionState::Granted {
            info!(permission = %permission, "notification permission not granted");
            return AutoOutcome::Skipped(SkipReason::PermissionDenied);
        }

        match self.ensure_subscription(Register::OnlyIfNew).await {
            Ok((_, created)) => {
                self.state.subscribed = true;
                info!(registered = created, "auto-subscribed to push");
                AutoOutcome::Subscribed {
                    registered: created,
                }
            }
            Err(e) => {
                warn!(error = %e, "auto-subscribe failed");
                AutoOutcome::Failed(e)
            }
        }
    }

    /// Subscribe on explicit user action. Always asks for permission.
    pub async fn subscribe(&mut self) -> bool {
        if !self.state.supported {
            debug!("push not supported, subscribe ignored");
            return false;
        }

        self.state.loading = true;
        let result = self.subscribe_inner().await;
        self.state.loading = false;

        match result {
            Ok(subscription) => {
                self.state.subscribed = true;
                info!(endpoint = %subscription.endpoint, "subscribed to push");
                true
            }
            Err(e) => {
                warn!(error = %e, "subscribe failed");
                false
            }
        }
    }

    async fn subscribe_inner(&mut self) -> Result<PushSubscription, PushError> {
        let permission = self.platform.request_permission().await?;
        self.state.permission = permission;
        if permission != PermissionState::Granted {
            return Err(PushError::PermissionDenied(permission));
        }
        let (subscription, _) = self.ensure_subscription(Register::Always).await?;
        Ok(subscription)
    }

    /// Unsubscribe on explicit user action.
    ///
    /// The server is told first, then the platform subscription is revoked.
    /// `subscribed` ends false whatever happens.
    pub async fn unsubscribe(&mut self) -> bool {
        if !self.state.supported {
            return false;
        }

        self.state.loading = true;
        let ok = match self.platform.get_subscription().await {
            Ok(Some(subscription)) => self.unsubscribe_existing(&subscription).await,
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "failed to read push subscription");
                false
            }
        };
        self.state.subscribed = false;
        self.state.loading = false;
        ok
    }

    async fn unsubscribe_existing(&self, subscription: &PushSubscription) -> bool {
        let mut ok = true;
        if let Err(e) = self.sync.unregister(&subscription.endpoint).await {
            warn!(error = %e, "server unsubscribe failed, revoking locally");
            ok = false;
        }
        match self.platform.unsubscribe(subscription).await {
            Ok(revoked) => debug!(revoked, "platform subscription revoked"),
            Err(e) => {
                warn!(error = %e, "platform unsubscribe failed");
                ok = false;
            }
        }
        ok
    }

    /// Fetch key, reuse or create the platform subscription, then register.
    async fn ensure_subscription(
        &self,
        register: Register,
    ) -> Result<(PushSubscription, bool), PushError> {
        let key = self.sync.public_key().await?;
        let key = decode_application_server_key(&key)?;

        let (subscription, created) = match self.platform.get_subscription().await? {
            Some(existing) => (existing, false),
            None => {
                let options = SubscriptionOptions::new(self.config.user_visible_only, key);
                (self.platform.subscribe(&options).await?, true)
            }
        };

        if register == Register::Always || created {
            self.sync.register(&subscription).await?;
        }
        Ok((subscription, created))
    }
}
