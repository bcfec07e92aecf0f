//! Core abstractions shared by the offline worker and the push controller.
//!
//! This crate provides the fundamental types and traits:
//! - `Request` / `Response` - Platform-neutral fetch model
//! - `Network` trait - The outbound fetch seam
//! - `Scope` - The worker's origin and path resolution
//! - `WorkerConfig` / `PushConfig` - Build-time configuration

mod config;
mod fetch;
mod network;
mod scope;

pub use config::*;
pub use fetch::*;
pub use network::*;
pub use scope::*;
