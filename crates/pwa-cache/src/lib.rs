//! Versioned request/response storage for the offline worker.
//!
//! This crate provides:
//! - `CacheStorage` / `Cache` - Named store backends (browser or in-memory)
//! - `CacheKey` - Request identity (method + URL, GET only)
//! - `Admission` - Which responses may be persisted
//! - `CacheStore` - The current-version store with install/activate lifecycle
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use pwa_cache::{activate, install, CacheStore, MemoryCacheStorage};
//! use pwa_core::CacheVersion;
//!
//! let store = CacheStore::new(Rc::new(MemoryCacheStorage::new()), CacheVersion::new("v2"));
//!
//! // Install pre-caches the shell, activate evicts every other generation.
//! let report = install(&store, &control, &network, &scope, &config.shell_resources).await;
//! let evicted = activate(&store, &control).await?;
//! ```

mod key;
mod lifecycle;
mod memory;
mod policy;
mod storage;

pub use key::*;
pub use lifecycle::*;
pub use memory::*;
pub use policy::*;
pub use storage::*;
