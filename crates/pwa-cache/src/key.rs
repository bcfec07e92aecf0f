//! Cache key composition.

use pwa_core::{Method, Request};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::storage::CacheError;

/// A cache key uniquely identifying a stored response.
///
/// Entries are keyed purely by request identity: the method and the URL
/// without its fragment. Only GET requests have a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a request.
    pub fn for_request(request: &Request) -> Result<Self, CacheError> {
        if request.method != Method::GET {
            return Err(CacheError::UnsupportedMethod(request.method.to_string()));
        }
        Ok(Self::for_url(&request.url))
    }

    /// Build the key for a GET of the given URL.
    pub fn for_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(format!("GET {}", url))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = CacheKey::for_url(&url("https://app.example.com/logo.png#top"));
        let b = CacheKey::for_url(&url("https://app.example.com/logo.png"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "GET https://app.example.com/logo.png");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = CacheKey::for_url(&url("https://app.example.com/font.woff2?v=1"));
        let b = CacheKey::for_url(&url("https://app.example.com/font.woff2?v=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_non_get_has_no_key() {
        let req = Request::new(Method::POST, url("https://app.example.com/form"));
        assert!(matches!(
            CacheKey::for_request(&req),
            Err(CacheError::UnsupportedMethod(m)) if m == "POST"
        ));
    }
}
