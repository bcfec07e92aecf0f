//! Outbound fetch seam.

use std::rc::Rc;

use async_trait::async_trait;

use crate::fetch::{Request, Response};

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("request error: {0}")]
    Request(String),
}

/// The platform's network fetch.
///
/// Implementations must not impose their own timeout; the platform's request
/// lifecycle bounds every fetch. Execution contexts are single threaded, so
/// futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait Network {
    /// Perform the request against the live network.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

#[async_trait(?Send)]
impl<T: Network + ?Sized> Network for Rc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request).await
    }
}
