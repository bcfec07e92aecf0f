//! Push permission and subscription lifecycle.
//!
//! This crate provides:
//! - `PushSubscription` / `SubscriptionOptions` - The platform subscription model
//! - `PushManager` / `PushPlatform` - Seams over the platform push and permission APIs
//! - `ServerSync` / `HttpServerSync` - Mirroring subscriptions to the application server
//! - `SubscriptionController` - Auto and manual subscribe, unsubscribe
//! - `ControllerHandle` - Queued access to one controller from overlapping callers
//! - `resubscribe` - Replacement of a subscription invalidated by the platform
//!
//! # Example
//!
//! ```ignore
//! use pwa_push::{AutoSubscribe, HttpServerSync, SubscriptionController};
//!
//! let sync = HttpServerSync::new(network, scope, push_config.clone());
//! let mut controller = SubscriptionController::new(platform, sync, push_config);
//!
//! controller.refresh().await;
//! controller
//!     .auto_subscribe(AutoSubscribe { enabled: true, authenticated: session.is_some() })
//!     .await;
//! ```

mod controller;
mod error;
mod handle;
mod platform;
mod rekey;
mod subscription;
mod sync;

pub use controller::*;
pub use error::PushError;
pub use handle::ControllerHandle;
pub use platform::*;
pub use rekey::*;
pub use subscription::*;
pub use sync::*;
