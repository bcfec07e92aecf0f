//! The worker's origin.

use url::Url;

use crate::config::ConfigError;

/// Origin the worker serves, used to resolve configured paths and to decide
/// whether a URL belongs to this application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    base: Url,
}

impl Scope {
    /// Create a scope from an absolute base URL.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Parse a scope from a URL string.
    pub fn parse(base: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base).map_err(|e| ConfigError::InvalidUrl {
            value: base.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(base))
    }

    /// The base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a path (or absolute URL) against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Whether the URL shares this scope's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        self.base.origin() == url.origin()
    }

    /// Whether a raw URL string shares this scope's origin. Unparseable URLs never do.
    pub fn is_same_origin_str(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| self.is_same_origin(&u))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let scope = Scope::parse("https://app.example.com/").unwrap();
        assert_eq!(
            scope.resolve("/manifest.json").unwrap().as_str(),
            "https://app.example.com/manifest.json"
        );
        assert_eq!(
            scope.resolve("https://cdn.example.net/a.png").unwrap().as_str(),
            "https://cdn.example.net/a.png"
        );
    }

    #[test]
    fn test_same_origin() {
        let scope = Scope::parse("https://app.example.com/").unwrap();
        assert!(scope.is_same_origin_str("https://app.example.com/quotes?id=1"));
        assert!(!scope.is_same_origin_str("http://app.example.com/"));
        assert!(!scope.is_same_origin_str("https://app.example.com:8443/"));
        assert!(!scope.is_same_origin_str("not a url"));
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(matches!(Scope::parse("/relative"), Err(ConfigError::InvalidUrl { .. })));
    }
}
