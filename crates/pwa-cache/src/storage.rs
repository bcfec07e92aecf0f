//! Named cache store backends.

use std::rc::Rc;

use async_trait::async_trait;
use pwa_core::{Request, Response};

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Only GET requests can be stored or matched.
    #[error("request method {0} cannot be cached")]
    UnsupportedMethod(String),

    /// The platform refused to open the named store.
    #[error("failed to open cache {name}: {reason}")]
    Open { name: String, reason: String },

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

/// A single named store of request -> response snapshots.
#[async_trait(?Send)]
pub trait Cache {
    /// Find the stored response for a request.
    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>>;

    /// Store a response snapshot, replacing any previous entry for the request.
    async fn put(&self, request: &Request, response: Response) -> CacheResult<()>;
}

/// The set of named stores for an origin.
#[async_trait(?Send)]
pub trait CacheStorage {
    /// Open (creating if needed) the named store.
    async fn open(&self, name: &str) -> CacheResult<Rc<dyn Cache>>;

    /// Whether the named store exists.
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Names of all existing stores.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Delete the named store.
    async fn delete(&self, name: &str) -> CacheResult<bool>;
}
