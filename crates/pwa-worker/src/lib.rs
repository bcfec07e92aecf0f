//! Background worker handlers.
//!
//! This crate turns platform events into explicit intents:
//! - `Route` / `classify` - Per-request strategy selection
//! - `FetchInterceptor` - Network-first and cache-first strategies with write-through
//! - `PushReceiver` - Push message to displayed notification
//! - `NotificationRouter` - Notification click to focused or opened window
//! - `ServiceWorker` - Dispatch table from `WorkerEvent` to `Intent`
//!
//! Nothing here touches browser APIs; `pwa-web` binds the seams.

mod dispatch;
mod error;
mod interceptor;
mod offline;
mod push;
mod route;
mod router;
mod spawn;

pub use dispatch::*;
pub use error::WorkerError;
pub use interceptor::*;
pub use offline::*;
pub use push::*;
pub use route::*;
pub use router::*;
pub use spawn::*;
