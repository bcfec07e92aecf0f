//! Replacing a subscription the platform invalidated.

use pwa_core::PushConfig;
use tracing::{info, warn};

use crate::error::PushError;
use crate::platform::PushManager;
use crate::subscription::{decode_application_server_key, PushSubscription, SubscriptionOptions};
use crate::sync::ServerSync;

/// A platform notice that the subscription changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChange {
    /// The invalidated subscription, when the platform still knows it.
    pub old_subscription: Option<PushSubscription>,
    /// A replacement the platform created on its own, if any.
    pub new_subscription: Option<PushSubscription>,
}

/// Create a replacement subscription and register it with the server.
///
/// The old subscription's options are reused verbatim. With
/// `verify_rekey_key` set, the server's current key is fetched and a
/// mismatch is logged; the old options are still used. Without an old
/// subscription, options are built from a fresh key fetch.
pub async fn resubscribe<M, S>(
    manager: &M,
    sync: &S,
    change: &SubscriptionChange,
    config: &PushConfig,
) -> Result<PushSubscription, PushError>
where
    M: PushManager + ?Sized,
    S: ServerSync + ?Sized,
{
    let options = match &change.old_subscription {
        Some(old) => {
            if config.verify_rekey_key {
                verify_key(sync, &old.options).await;
            }
            old.options.clone()
        }
        None => {
            let key = decode_application_server_key(&sync.public_key().await?)?;
            SubscriptionOptions::new(config.user_visible_only, key)
        }
    };

    let replacement = manager.subscribe(&options).await?;
    sync.register(&replacement).await?;
    info!(endpoint = %replacement.endpoint, "push subscription replaced");
    Ok(replacement)
}

async fn verify_key<S: ServerSync + ?Sized>(sync: &S, options: &SubscriptionOptions) {
    let current = match sync.public_key().await {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "could not fetch server key for re-key check");
            return;
        }
    };
    match decode_application_server_key(&current) {
        Ok(bytes) if options.application_server_key.as_deref() == Some(bytes.as_slice()) => {}
        Ok(_) => warn!("server key changed; re-subscribing with the previous key"),
        Err(e) => warn!(error = %e, "server returned an unusable key"),
    }
}
