//! Platform push and permission seams.

use async_trait::async_trait;

use crate::error::PushError;
use crate::subscription::{PermissionState, PushSubscription, SubscriptionOptions};

/// Facilities detected in the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// A worker registration is available.
    pub service_worker: bool,
    /// The push manager is available.
    pub push_manager: bool,
}

impl Capabilities {
    /// Everything present.
    pub fn full() -> Self {
        Self {
            service_worker: true,
            push_manager: true,
        }
    }

    /// Nothing present.
    pub fn none() -> Self {
        Self::default()
    }

    /// Push messaging needs both facilities.
    pub fn is_supported(&self) -> bool {
        self.service_worker && self.push_manager
    }
}

/// The platform push manager of the worker registration.
///
/// Shared by the foreground controller and the worker's re-key handler.
#[async_trait(?Send)]
pub trait PushManager {
    /// The current subscription, if any.
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PushError>;

    /// Create a subscription (or return the existing one for identical options).
    async fn subscribe(&self, options: &SubscriptionOptions) -> Result<PushSubscription, PushError>;

    /// Revoke a subscription locally. Returns whether anything was revoked.
    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<bool, PushError>;
}

/// Foreground view of the platform: push manager plus capability and permission.
#[async_trait(?Send)]
pub trait PushPlatform: PushManager {
    /// Probe the runtime's facilities.
    fn capabilities(&self) -> Capabilities;

    /// Current permission without prompting.
    fn permission(&self) -> PermissionState;

    /// Show the permission prompt and return the user's decision.
    async fn request_permission(&self) -> Result<PermissionState, PushError>;
}
