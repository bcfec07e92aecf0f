//! Push subscription model.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::PushError;

/// Notification permission, owned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Never asked (or the prompt was dismissed).
    #[default]
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    /// Parse the platform's permission string.
    pub fn from_platform(value: &str) -> Self {
        match value {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Default,
        }
    }

    /// Get the platform string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options a subscription was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Every push must result in a visible notification.
    pub user_visible_only: bool,
    /// Raw VAPID public key bytes (uncompressed P-256 point).
    pub application_server_key: Option<Vec<u8>>,
}

impl SubscriptionOptions {
    /// Options for a fresh subscription bound to the given key.
    pub fn new(user_visible_only: bool, application_server_key: Vec<u8>) -> Self {
        Self {
            user_visible_only,
            application_server_key: Some(application_server_key),
        }
    }
}

/// Client keys of a subscription (base64url, as exported by the platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// P-256 ECDH public key.
    pub p256dh: String,
    /// Shared auth secret.
    pub auth: String,
}

/// A platform-issued push subscription.
///
/// Serializes to the server wire shape `{ endpoint, keys: { p256dh, auth } }`;
/// the creation options stay local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Push service endpoint URL; identifies the subscription server-side.
    pub endpoint: String,
    /// Client keys.
    pub keys: SubscriptionKeys,
    /// Options used to create the subscription.
    #[serde(skip)]
    pub options: SubscriptionOptions,
}

impl PushSubscription {
    /// Create a subscription record.
    pub fn new(
        endpoint: impl Into<String>,
        keys: SubscriptionKeys,
        options: SubscriptionOptions,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys,
            options,
        }
    }
}

/// Decode a base64url VAPID public key (padding optional) into raw bytes.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>, PushError> {
    let trimmed = key.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(PushError::InvalidKey("empty key".to_string()));
    }
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| PushError::InvalidKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_omits_options() {
        let sub = PushSubscription::new(
            "https://push.example.net/send/abc",
            SubscriptionKeys {
                p256dh: "BPk".to_string(),
                auth: "xyz".to_string(),
            },
            SubscriptionOptions::new(true, vec![4, 1, 2]),
        );

        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "endpoint": "https://push.example.net/send/abc",
                "keys": {"p256dh": "BPk", "auth": "xyz"}
            })
        );
    }

    #[test]
    fn test_decode_key_with_and_without_padding() {
        // [0x04, 0xff, 0xfe] in base64url
        assert_eq!(decode_application_server_key("BP_-").unwrap(), vec![0x04, 0xff, 0xfe]);
        assert_eq!(decode_application_server_key("BA==").unwrap(), vec![0x04]);
        assert_eq!(decode_application_server_key(" BA ").unwrap(), vec![0x04]);
    }

    #[test]
    fn test_decode_key_rejects_garbage() {
        assert!(matches!(
            decode_application_server_key(""),
            Err(PushError::InvalidKey(_))
        ));
        assert!(matches!(
            decode_application_server_key("not/base64url+"),
            Err(PushError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_permission_from_platform() {
        assert_eq!(PermissionState::from_platform("granted"), PermissionState::Granted);
        assert_eq!(PermissionState::from_platform("denied"), PermissionState::Denied);
        assert_eq!(PermissionState::from_platform("prompt"), PermissionState::Default);
    }
}
