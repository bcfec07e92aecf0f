//! Worker error types.

use thiserror::Error;

/// Errors raised inside worker event handlers.
///
/// Handlers log these and degrade; none reach the platform as a failed event
/// except a fetch with nothing to serve.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Strategy evaluation failed; the request is left to the platform.
    #[error("interceptor fault: {0}")]
    Interceptor(String),

    /// Showing a notification failed.
    #[error("notification error: {0}")]
    Notification(String),

    /// Window client enumeration, navigation or opening failed.
    #[error("client error: {0}")]
    Client(String),
}
