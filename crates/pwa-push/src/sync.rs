//! Mirroring subscriptions to the application server.

use async_trait::async_trait;
use pwa_core::{Method, Network, NetworkError, PushConfig, Request, Scope};
use serde::{Deserialize, Serialize};

use crate::error::PushError;
use crate::subscription::PushSubscription;

/// Application server endpoints for push.
///
/// Session credentials ride along implicitly; callers never attach them.
#[async_trait(?Send)]
pub trait ServerSync {
    /// Fetch the base64url VAPID public key.
    async fn public_key(&self) -> Result<String, PushError>;

    /// Register a subscription for the current user.
    async fn register(&self, subscription: &PushSubscription) -> Result<(), PushError>;

    /// Remove a subscription by endpoint.
    async fn unregister(&self, endpoint: &str) -> Result<(), PushError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyBody {
    public_key: String,
}

#[derive(Debug, Serialize)]
struct UnsubscribeBody<'a> {
    endpoint: &'a str,
}

/// `ServerSync` over the platform fetch.
pub struct HttpServerSync<N> {
    network: N,
    scope: Scope,
    config: PushConfig,
}

impl<N: Network> HttpServerSync<N> {
    /// Create a client for the endpoints in `config`, resolved against `scope`.
    pub fn new(network: N, scope: Scope, config: PushConfig) -> Self {
        Self {
            network,
            scope,
            config,
        }
    }

    /// Get the endpoint configuration.
    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> Result<Request, PushError> {
        let url = self
            .scope
            .resolve(path)
            .map_err(|e| PushError::Network(NetworkError::Request(e.to_string())))?;
        Ok(Request::new(method, url))
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), PushError> {
        let url = self
            .scope
            .resolve(path)
            .map_err(|e| PushError::Network(NetworkError::Request(e.to_string())))?;
        let request = Request::post_json(url, body)
            .map_err(|e| PushError::Network(NetworkError::Request(e.to_string())))?;

        let response = self.network.fetch(&request).await?;
        response.error_for_status().map_err(server_error)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl<N: Network> ServerSync for HttpServerSync<N> {
    async fn public_key(&self) -> Result<String, PushError> {
        let request = self.request(Method::GET, &self.config.public_key_endpoint)?;
        let response = self
            .network
            .fetch(&request)
            .await?
            .error_for_status()
            .map_err(server_error)?;

        let body: PublicKeyBody = response.json()?;
        if body.public_key.trim().is_empty() {
            return Err(PushError::InvalidKey("server returned an empty key".to_string()));
        }
        Ok(body.public_key)
    }

    async fn register(&self, subscription: &PushSubscription) -> Result<(), PushError> {
        self.post(&self.config.subscribe_endpoint, subscription).await
    }

    async fn unregister(&self, endpoint: &str) -> Result<(), PushError> {
        self.post(&self.config.unsubscribe_endpoint, &UnsubscribeBody { endpoint })
            .await
    }
}

fn server_error(e: NetworkError) -> PushError {
    PushError::Server(e.to_string())
}
