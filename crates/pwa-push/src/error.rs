//! Push error types.

use pwa_core::NetworkError;
use thiserror::Error;

use crate::subscription::PermissionState;

/// Errors raised along the subscribe/unsubscribe sequences.
///
/// None of these escape the controller: they are logged and reflected in
/// `SubscriptionState` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The runtime lacks the worker or push facility.
    #[error("push messaging is not supported in this runtime")]
    Unsupported,

    /// The user did not grant notification permission.
    #[error("notification permission not granted ({0})")]
    PermissionDenied(PermissionState),

    /// The platform push API failed.
    #[error("platform push error: {0}")]
    Platform(String),

    /// The application server rejected a call.
    #[error("server sync failed: {0}")]
    Server(String),

    /// The server's public key could not be used.
    #[error("invalid application server key: {0}")]
    InvalidKey(String),

    /// Transport failure talking to the server.
    #[error(transparent)]
    Network(#[from] NetworkError),
}
