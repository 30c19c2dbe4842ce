//! Offline support for the application shell.
//!
//! This module keeps the app usable with degraded or no connectivity:
//! - Precaches a fixed app shell under a versioned cache generation
//! - Classifies intercepted requests and applies a per-class strategy
//!   (network-first, cache-first, stale-while-revalidate, or passthrough)
//! - Rotates cache generations on activation and checks for shell updates
//!   on a timer

mod classify;
mod controller;
mod net;
mod request;
mod response;
mod store;
mod update;

pub use classify::{classify, RequestClass, Strategy, PRECACHE_PATHS};
pub use controller::{FetchDecision, LifecyclePhase, OfflineController};
pub use net::{Fetcher, HttpFetcher};
pub use request::{FetchRequest, RequestMethod, RequestMode};
pub use response::CachedResponse;
pub use store::{CacheStore, MemoryCacheStore, SqliteCacheStore};
pub use update::spawn_update_checker;
