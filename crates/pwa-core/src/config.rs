//! Worker and push configuration.
//!
//! Configuration is fixed when the worker script is built. `CacheVersion`
//! defaults to the `PWA_CACHE_VERSION` environment variable seen by the
//! compiler, so shipping a new worker build with a new version string is the
//! only way to evict older cache generations.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    /// Failed to parse TOML or JSON.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A URL value could not be parsed.
    #[error("invalid URL {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },

    /// A field holds an unusable value.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Identifier of the active cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Create a cache version from a string.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The version injected at build time.
    pub fn from_build() -> Self {
        match option_env!("PWA_CACHE_VERSION") {
            Some(version) => Self::new(version),
            None => Self::new(concat!("pwa-cache-v", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Get the version string (also the cache store name).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        Self::from_build()
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content of the synthesized offline document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflinePage {
    /// Document language.
    pub lang: String,
    /// Document title.
    pub title: String,
    /// Main heading.
    pub heading: String,
    /// Explanatory paragraph.
    pub message: String,
}

impl Default for OfflinePage {
    fn default() -> Self {
        Self {
            lang: "es".to_string(),
            title: "Sin conexión".to_string(),
            heading: "Sin conexión".to_string(),
            message: "No hay conexión a internet. Verifica tu conexión e intenta nuevamente."
                .to_string(),
        }
    }
}

/// An action button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    /// Action identifier reported back on interaction.
    pub action: String,
    /// Button label.
    pub title: String,
}

impl NotificationAction {
    /// Create an action.
    pub fn new(action: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
        }
    }
}

/// Defaults applied to inbound push payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationDefaults {
    /// Title when the payload has none.
    pub title: String,
    /// Body when the payload has none.
    pub body: String,
    /// Target URL when the payload has none.
    pub url: String,
    /// Notification icon.
    pub icon: String,
    /// Monochrome badge icon.
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    /// Keep the notification until the user dismisses it.
    pub require_interaction: bool,
    /// Action buttons.
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "Nueva notificación".to_string(),
            body: "Tienes una nueva actualización".to_string(),
            url: "/".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/icon-72x72.png".to_string(),
            vibrate: vec![200, 100, 200],
            require_interaction: true,
            actions: vec![
                NotificationAction::new("open", "Abrir"),
                NotificationAction::new("close", "Cerrar"),
            ],
        }
    }
}

/// Background worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Active cache generation.
    pub cache_version: CacheVersion,
    /// Paths pre-cached on install.
    pub shell_resources: Vec<String>,
    /// Cached paths tried, in order, for offline navigations.
    pub navigation_fallbacks: Vec<String>,
    /// Path prefixes never intercepted.
    pub excluded_prefixes: Vec<String>,
    /// Synthesized offline document.
    pub offline_page: OfflinePage,
    /// Push notification defaults.
    pub notifications: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: CacheVersion::default(),
            shell_resources: vec![
                "/".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
            ],
            navigation_fallbacks: vec!["/".to_string(), "/index.html".to_string()],
            excluded_prefixes: vec!["/api/".to_string(), "/socket.io/".to_string()],
            offline_page: OfflinePage::default(),
            notifications: NotificationDefaults::default(),
        }
    }
}

impl WorkerConfig {
    /// Set the cache version.
    pub fn with_cache_version(mut self, version: CacheVersion) -> Self {
        self.cache_version = version;
        self
    }

    /// Replace the excluded prefixes.
    pub fn with_excluded_prefixes(mut self, prefixes: Vec<&str>) -> Self {
        self.excluded_prefixes = prefixes.into_iter().map(String::from).collect();
        self
    }

    /// The excluded namespace a request path falls under, if any.
    ///
    /// A prefix also matches its own root without the trailing slash
    /// (`/api/` covers `/api`).
    pub fn excluded_prefix(&self, path: &str) -> Option<&str> {
        self.excluded_prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| path.starts_with(prefix) || path == prefix.trim_end_matches('/'))
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "cache_version",
                reason: "must not be empty".to_string(),
            });
        }

        for path in &self.shell_resources {
            require_absolute_path("shell_resources", path)?;
        }
        for path in &self.navigation_fallbacks {
            require_absolute_path("navigation_fallbacks", path)?;
        }
        for prefix in &self.excluded_prefixes {
            require_absolute_path("excluded_prefixes", prefix)?;
        }

        if self.offline_page.title.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "offline_page.title",
                reason: "must not be empty".to_string(),
            });
        }

        let url = &self.notifications.url;
        if !url.starts_with('/') && !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ConfigError::Invalid {
                field: "notifications.url",
                reason: format!("{:?} is neither a path nor an http(s) URL", url),
            });
        }

        Ok(())
    }
}

fn require_absolute_path(field: &'static str, path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{:?} must start with '/'", path),
        })
    }
}

/// Foreground push subscription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// `GET` endpoint returning `{ publicKey }`.
    pub public_key_endpoint: String,
    /// `POST` endpoint registering a subscription.
    pub subscribe_endpoint: String,
    /// `POST` endpoint removing a subscription.
    pub unsubscribe_endpoint: String,
    /// Every push must show a notification.
    pub user_visible_only: bool,
    /// On re-key, compare the reused key with the server's current key and warn on mismatch.
    pub verify_rekey_key: bool,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            public_key_endpoint: "/api/push/vapid-public-key".to_string(),
            subscribe_endpoint: "/api/push/subscribe".to_string(),
            unsubscribe_endpoint: "/api/push/unsubscribe".to_string(),
            user_visible_only: true,
            verify_rekey_key: false,
        }
    }
}

impl PushConfig {
    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_absolute_path("public_key_endpoint", &self.public_key_endpoint)?;
        require_absolute_path("subscribe_endpoint", &self.subscribe_endpoint)?;
        require_absolute_path("unsubscribe_endpoint", &self.unsubscribe_endpoint)?;
        Ok(())
    }
}

/// Complete configuration file (`pwa.toml` / `pwa.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Background worker section.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Push subscription section.
    #[serde(default)]
    pub push: PushConfig,
}

impl AppConfig {
    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.worker.validate()?;
        self.push.validate()
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.worker.cache_version.as_str().is_empty());
    }

    #[test]
    fn test_excluded_prefixes() {
        let config = WorkerConfig::default();
        assert_eq!(config.excluded_prefix("/api/quotes"), Some("/api/"));
        assert_eq!(config.excluded_prefix("/socket.io/"), Some("/socket.io/"));
        assert_eq!(config.excluded_prefix("/apis"), None);
        assert_eq!(config.excluded_prefix("/quotes"), None);
    }

    #[test]
    fn test_excluded_prefix_matches_bare_root() {
        let config = WorkerConfig::default();
        assert_eq!(config.excluded_prefix("/api"), Some("/api/"));
        assert_eq!(config.excluded_prefix("/socket.io"), Some("/socket.io/"));
        assert_eq!(config.excluded_prefix("/"), None);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = AppConfig::from_toml_str(
            r#"
            [worker]
            cache_version = "shop-v7"
            excluded_prefixes = ["/api/", "/ws/"]

            [push]
            verify_rekey_key = true
            "#,
        )
        .unwrap();

        assert_eq!(config.worker.cache_version.as_str(), "shop-v7");
        assert_eq!(config.worker.excluded_prefix("/ws/chat"), Some("/ws/"));
        assert_eq!(config.worker.navigation_fallbacks, vec!["/", "/index.html"]);
        assert!(config.push.verify_rekey_key);
        assert_eq!(config.push.subscribe_endpoint, "/api/push/subscribe");
    }

    #[test]
    fn test_json_config() {
        let config = AppConfig::from_json_str(
            r#"{"worker": {"notifications": {"title": "Hola"}}}"#,
        )
        .unwrap();
        assert_eq!(config.worker.notifications.title, "Hola");
        assert_eq!(config.worker.notifications.vibrate, vec![200, 100, 200]);
    }

    #[test]
    fn test_validate_rejects_relative_prefix() {
        let config = WorkerConfig::default().with_excluded_prefixes(vec!["api/"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "excluded_prefixes", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_version() {
        let config = WorkerConfig::default().with_cache_version(CacheVersion::new("  "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str("worker = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip_keeps_version() {
        let config = AppConfig {
            worker: WorkerConfig::default().with_cache_version(CacheVersion::new("v9")),
            push: PushConfig::default(),
        };
        let text = config.to_toml_string().unwrap();
        let parsed = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.worker.cache_version, CacheVersion::new("v9"));
    }
}
