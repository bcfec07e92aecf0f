//! Browser bindings.
//!
//! Binds the platform-neutral handlers to the browser:
//! - `start_worker` - Registers the worker's event listeners (call from the worker script)
//! - `PushController` - The page's subscription controller, exported to JavaScript
//!
//! Everything here only exists on `wasm32`.

#![cfg(target_arch = "wasm32")]

mod console;
mod convert;
mod page;
mod platform;
mod push;
mod worker;

pub use page::PushController;
pub use worker::start_worker;
