//! Strategy selection for intercepted requests.

use pwa_core::{Method, Request, WorkerConfig};

/// Why a request is left to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BypassReason {
    /// Only GET is intercepted.
    Method(Method),
    /// Path under an excluded namespace (API, realtime channel).
    Excluded(String),
}

impl std::fmt::Display for BypassReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Method(method) => write!(f, "method {} is not intercepted", method),
            Self::Excluded(prefix) => write!(f, "path is under excluded prefix {}", prefix),
        }
    }
}

/// How one request is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted at all.
    Bypass(BypassReason),
    /// Full-document load: network, then cached shell, then the offline page.
    Navigation,
    /// Script or stylesheet: network, then cache.
    NetworkFirst,
    /// Everything else: cache, then network with write-through.
    CacheFirst,
}

impl Route {
    /// Label used in logs and counters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bypass(_) => "bypass",
            Self::Navigation => "navigation",
            Self::NetworkFirst => "network_first",
            Self::CacheFirst => "cache_first",
        }
    }

    /// Whether the request is intercepted.
    pub fn intercepts(&self) -> bool {
        !matches!(self, Self::Bypass(_))
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bypass(reason) => write!(f, "bypass ({})", reason),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Pick the route for a request. Rules apply in order; the first match wins.
pub fn classify(request: &Request, config: &WorkerConfig) -> Route {
    if request.method != Method::GET {
        return Route::Bypass(BypassReason::Method(request.method.clone()));
    }

    let path = request.path();
    if let Some(prefix) = config.excluded_prefix(path) {
        return Route::Bypass(BypassReason::Excluded(prefix.to_string()));
    }

    if request.is_navigation() {
        return Route::Navigation;
    }
    if request.destination.is_code() {
        return Route::NetworkFirst;
    }
    Route::CacheFirst
}
