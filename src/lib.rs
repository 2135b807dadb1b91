//! apkfetch - keep a set of Android packages current.
//!
//! Talks the Play market's private "Finsky" API: authenticates a device
//! session, pulls metadata for a configured package set, diffs version
//! codes against a local SQLite catalog, and downloads the artifacts
//! that changed.
//!
//! # Architecture
//!
//! - **market**: wire messages, the pure codec, the session (auth,
//!   token lifecycle, prefetch cache) and the protocol client.
//! - **ops**: reconciliation (what to fetch) and the download pipeline.
//! - **store**: SQLite catalog of downloaded package state plus the
//!   persisted auth token.
//! - **config**: YAML config discovery and melding.
//! - **ui**: console rendering.
//!
//! All I/O is synchronous and sequential: one request or download at a
//! time, processed in name order, so identical inputs produce identical
//! runs.

pub mod config;
pub mod market;
pub mod ops;
pub mod store;
pub mod types;
pub mod ui;

// Re-exports for convenience
pub use market::client::MarketClient;
pub use market::session::{Credentials, DeviceProfile, Endpoints, Session};
pub use store::db::CatalogDb;
pub use types::{ApkRecord, DownloadTicket, PackageName, RemoteApk};
